pub mod local;
pub mod s3;

use crate::backup::archiver::ARCHIVE_EXT;
use crate::backup::object_store::local::{LocalBucket, LocalStoreConfig};
use crate::backup::object_store::s3::{S3Bucket, S3StoreConfig};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddMsg;
use derive_more::From;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::result;
use validator::{Validate, ValidationErrors};

/// Where archives are uploaded to
#[derive(Clone, From, Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum ObjectStoreConfig {
    S3(S3StoreConfig),
    Local(LocalStoreConfig),
}

impl Validate for ObjectStoreConfig {
    fn validate(&self) -> result::Result<(), ValidationErrors> {
        match self {
            ObjectStoreConfig::S3(inner) => inner.validate(),
            ObjectStoreConfig::Local(inner) => inner.validate(),
        }
    }
}

impl ObjectStoreConfig {
    /// Opens a handle on the configured bucket
    ///
    /// Fails with [`Error::AuthFailure`] when the credentials are refused.
    pub fn connect(&self) -> Result<Bucket> {
        match self {
            ObjectStoreConfig::S3(inner) => inner.connect().map(Bucket::from),
            ObjectStoreConfig::Local(inner) => inner.connect().map(Bucket::from),
        }
    }
}

/// Primitive operations of a bucket of named blobs
pub trait ObjectStore {
    /// Human readable bucket name, used in errors
    fn name(&self) -> &str;

    /// Every key starting with `prefix`, in no particular order
    fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>>;

    fn contains(&self, key: &str) -> Result<bool>;

    fn put_file(&self, key: &str, src: &Path) -> Result<()>;

    fn get_to_file(&self, key: &str, dest: &Path) -> Result<()>;
}

/// A connected bucket, whichever backend it lives on
#[derive(From, Debug)]
pub enum Bucket {
    S3(S3Bucket),
    Local(LocalBucket),
}

impl ObjectStore for Bucket {
    fn name(&self) -> &str {
        match self {
            Bucket::S3(inner) => inner.name(),
            Bucket::Local(inner) => inner.name(),
        }
    }

    fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        match self {
            Bucket::S3(inner) => inner.keys(prefix),
            Bucket::Local(inner) => inner.keys(prefix),
        }
    }

    fn contains(&self, key: &str) -> Result<bool> {
        match self {
            Bucket::S3(inner) => inner.contains(key),
            Bucket::Local(inner) => inner.contains(key),
        }
    }

    fn put_file(&self, key: &str, src: &Path) -> Result<()> {
        match self {
            Bucket::S3(inner) => inner.put_file(key, src),
            Bucket::Local(inner) => inner.put_file(key, src),
        }
    }

    fn get_to_file(&self, key: &str, dest: &Path) -> Result<()> {
        match self {
            Bucket::S3(inner) => inner.get_to_file(key, dest),
            Bucket::Local(inner) => inner.get_to_file(key, dest),
        }
    }
}

/// Archive keys in the bucket, oldest first
///
/// The naming convention is fixed width and zero padded, so sorting the keys
/// sorts the archives chronologically.
pub fn list<S: ObjectStore + ?Sized>(store: &S, prefix: Option<&str>) -> Result<Vec<String>> {
    let suffix = format!(".{ARCHIVE_EXT}");
    Ok(store
        .keys(prefix)?
        .into_iter()
        .filter(|key| key.ends_with(suffix.as_str()))
        .filter(|key| prefix.map_or(true, |prefix| key.starts_with(prefix)))
        .sorted()
        .collect())
}

/// Uploads `local_path` under its file name, refusing to replace an existing key
pub fn upload<S: ObjectStore + ?Sized, P: AsRef<Path>>(store: &S, local_path: P) -> Result<String> {
    let local_path = local_path.as_ref();
    let key = local_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::not_found(local_path))?;

    if store.contains(&key)? {
        return Err(Error::duplicate_key(key));
    }

    tracing::info!("Uploading {:?} to bucket {:?}", local_path, store.name());
    store
        .put_file(&key, local_path)
        .add_msg(format!("Upload of {key:?} failed"))?;
    Ok(key)
}

/// Downloads `key`, or the newest archive matching `prefix`, to `dest_path`
pub fn download<S: ObjectStore + ?Sized, P: AsRef<Path>>(
    store: &S,
    dest_path: P,
    key: Option<&str>,
    prefix: Option<&str>,
) -> Result<String> {
    let key = match key {
        Some(key) => key.to_string(),
        None => list(store, prefix)?
            .pop()
            .ok_or_else(|| Error::empty_bucket(store.name()))?,
    };

    tracing::info!(
        "Downloading {:?} from bucket {:?} to {:?}",
        &key,
        store.name(),
        dest_path.as_ref()
    );
    store
        .get_to_file(&key, dest_path.as_ref())
        .add_msg(format!("Download of {key:?} failed"))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bucket(dir: &Path) -> Bucket {
        ObjectStoreConfig::from(LocalStoreConfig::builder().path(dir).build())
            .connect()
            .unwrap()
    }

    fn put(dir: &Path, name: &str, content: &[u8]) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_list_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        for name in [
            "backup_2024-06-01_00-00.tbz",
            "backup_2023-12-31_23-59.tbz",
            "nightly_2024-01-01_00-00.tbz",
            "backup_2024-01-01_00-00.tar",
            "README",
        ] {
            put(tmp.path(), name, b"x");
        }
        let bucket = bucket(tmp.path());

        assert_eq!(
            list(&bucket, Some("backup")).unwrap(),
            vec!["backup_2023-12-31_23-59.tbz", "backup_2024-06-01_00-00.tbz"]
        );
        assert_eq!(
            list(&bucket, None).unwrap(),
            vec![
                "backup_2023-12-31_23-59.tbz",
                "backup_2024-06-01_00-00.tbz",
                "nightly_2024-01-01_00-00.tbz"
            ]
        );
    }

    #[test]
    fn test_upload_uses_file_name_as_key() {
        let store_dir = TempDir::new().unwrap();
        let local_dir = TempDir::new().unwrap();
        put(local_dir.path(), "backup_2024-03-05_02-07.tbz", b"new archive");
        let bucket = bucket(store_dir.path());

        let key = upload(&bucket, local_dir.path().join("backup_2024-03-05_02-07.tbz")).unwrap();

        assert_eq!(key, "backup_2024-03-05_02-07.tbz");
        assert_eq!(
            std::fs::read(store_dir.path().join(&key)).unwrap(),
            b"new archive"
        );
    }

    #[test]
    fn test_upload_duplicate_key() {
        let store_dir = TempDir::new().unwrap();
        let local_dir = TempDir::new().unwrap();
        put(store_dir.path(), "backup_2024-03-05_02-07.tbz", b"remote history");
        put(local_dir.path(), "backup_2024-03-05_02-07.tbz", b"new archive");
        let bucket = bucket(store_dir.path());

        let result = upload(&bucket, local_dir.path().join("backup_2024-03-05_02-07.tbz"));

        assert!(matches!(result, Err(Error::DuplicateKey(key)) if key == "backup_2024-03-05_02-07.tbz"));
        assert_eq!(
            std::fs::read(store_dir.path().join("backup_2024-03-05_02-07.tbz")).unwrap(),
            b"remote history"
        );
    }

    #[test]
    fn test_download_latest() {
        let store_dir = TempDir::new().unwrap();
        let local_dir = TempDir::new().unwrap();
        put(store_dir.path(), "backup_2024-01-01_00-00.tbz", b"january");
        put(store_dir.path(), "backup_2024-06-01_00-00.tbz", b"june");
        put(store_dir.path(), "zzz-notes.txt", b"not an archive");
        let bucket = bucket(store_dir.path());
        let dest = local_dir.path().join("latest.tbz");

        let key = download(&bucket, &dest, None, Some("backup")).unwrap();

        assert_eq!(key, "backup_2024-06-01_00-00.tbz");
        assert_eq!(std::fs::read(&dest).unwrap(), b"june");
    }

    #[test]
    fn test_download_explicit_key() {
        let store_dir = TempDir::new().unwrap();
        let local_dir = TempDir::new().unwrap();
        put(store_dir.path(), "backup_2024-01-01_00-00.tbz", b"january");
        put(store_dir.path(), "backup_2024-06-01_00-00.tbz", b"june");
        let bucket = bucket(store_dir.path());
        let dest = local_dir.path().join("old.tbz");

        download(&bucket, &dest, Some("backup_2024-01-01_00-00.tbz"), None).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"january");
    }

    #[test]
    fn test_download_empty_bucket() {
        let store_dir = TempDir::new().unwrap();
        let local_dir = TempDir::new().unwrap();
        put(store_dir.path(), "nightly_2024-01-01_00-00.tbz", b"other series");
        let bucket = bucket(store_dir.path());

        let result = download(&bucket, local_dir.path().join("x.tbz"), None, Some("backup"));

        assert!(matches!(result, Err(Error::EmptyBucket(_))));
        assert!(!local_dir.path().join("x.tbz").exists());
    }
}
