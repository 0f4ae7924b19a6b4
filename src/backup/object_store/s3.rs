//! S3 compatible bucket backend.
//!
//! The SDK is async only. Each bucket handle owns a current thread runtime and
//! blocks on every request, which keeps the rest of the pipeline synchronous.

use crate::backup::object_store::ObjectStore;
use crate::backup::redacted::RedactedString;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::Client;
use bon::Builder;
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use tokio::runtime::Runtime;
use validator::Validate;

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct S3StoreConfig {
    #[validate(length(min = 3, max = 63))]
    #[builder(into)]
    bucket: String,
    #[validate(nested)]
    #[builder(into)]
    access_key_id: RedactedString,
    #[validate(nested)]
    #[builder(into)]
    secret_access_key: RedactedString,
    #[serde(default = "default_region")]
    #[builder(default = default_region(), into)]
    region: String,
    #[validate(url)]
    #[builder(into)]
    endpoint: Option<String>,
    #[serde(default)]
    #[builder(default)]
    force_path_style: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl S3StoreConfig {
    /// Builds a client and checks the bucket is reachable with the credentials
    pub fn connect(&self) -> Result<S3Bucket> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let credentials = Credentials::new(
            self.access_key_id.inner(),
            self.secret_access_key.inner(),
            None,
            None,
            "mongo_backup",
        );
        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(self.force_path_style);
        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let bucket = S3Bucket {
            client: Client::from_conf(builder.build()),
            bucket: self.bucket.clone(),
            runtime,
        };

        tracing::info!("Connecting to bucket {:?}", &bucket.bucket);
        bucket
            .runtime
            .block_on(bucket.client.head_bucket().bucket(&bucket.bucket).send())
            .map_err(|e| bucket.map_sdk_error(e))?;
        Ok(bucket)
    }
}

pub struct S3Bucket {
    client: Client,
    bucket: String,
    runtime: Runtime,
}

impl Debug for S3Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Bucket")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl S3Bucket {
    fn map_sdk_error<E>(&self, e: SdkError<E, HttpResponse>) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        map_sdk_error(&self.bucket, e)
    }
}

/// 401 and 403 become [`Error::AuthFailure`], anything else keeps the full
/// error chain in its message
fn map_sdk_error<E>(bucket: &str, e: SdkError<E, HttpResponse>) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    match e.raw_response().map(|r| r.status().as_u16()) {
        Some(401) | Some(403) => Error::auth_failure(bucket),
        _ => Error::object_store(DisplayErrorContext(e).to_string()),
    }
}

impl ObjectStore for S3Bucket {
    fn name(&self) -> &str {
        &self.bucket
    }

    fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        self.runtime.block_on(async {
            let mut keys = Vec::new();
            let mut continuation_token = None;
            loop {
                let output = self
                    .client
                    .list_objects_v2()
                    .bucket(&self.bucket)
                    .set_prefix(prefix.map(str::to_string))
                    .set_continuation_token(continuation_token.take())
                    .send()
                    .await
                    .map_err(|e| self.map_sdk_error(e))?;

                keys.extend(
                    output
                        .contents()
                        .iter()
                        .filter_map(|object| object.key())
                        .map(str::to_string),
                );

                match output.next_continuation_token() {
                    Some(token) if output.is_truncated() == Some(true) => {
                        continuation_token = Some(token.to_string())
                    }
                    _ => break,
                }
            }
            Ok::<_, Error>(keys)
        })
    }

    fn contains(&self, key: &str) -> Result<bool> {
        let result = self.runtime.block_on(
            self.client
                .head_object()
                .bucket(&self.bucket)
                .key(key)
                .send(),
        );
        match result {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(self.map_sdk_error(e)),
        }
    }

    fn put_file(&self, key: &str, src: &Path) -> Result<()> {
        self.runtime.block_on(async {
            let body = tokio::fs::read(src).await?;
            tracing::debug!("Uploading {} bytes to s3://{}/{key}", body.len(), &self.bucket);
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(body.into())
                .send()
                .await
                .map_err(|e| self.map_sdk_error(e))?;
            Ok::<_, Error>(())
        })
    }

    fn get_to_file(&self, key: &str, dest: &Path) -> Result<()> {
        self.runtime.block_on(async {
            let output = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| self.map_sdk_error(e))?;

            let mut body = output.body.into_async_read();
            let mut file = tokio::fs::File::create(dest).await?;
            tokio::io::copy(&mut body, &mut file).await?;
            tracing::debug!("Downloaded s3://{}/{key} to {:?}", &self.bucket, dest);
            Ok::<_, Error>(())
        })
    }
}
