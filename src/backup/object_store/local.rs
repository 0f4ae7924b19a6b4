//! A directory standing in for a bucket.
//!
//! Keys map to file names directly under the directory. Useful for NFS style
//! targets and for exercising the backup pipeline without network access.

use crate::backup::object_store::ObjectStore;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::validate::validate_dir_exist;
use bon::Builder;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use validator::Validate;

#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct LocalStoreConfig {
    #[validate(custom(function = validate_dir_exist))]
    #[builder(into)]
    path: PathBuf,
}

impl LocalStoreConfig {
    pub fn connect(&self) -> Result<LocalBucket> {
        match std::fs::read_dir(&self.path) {
            Ok(_) => Ok(LocalBucket {
                name: self.path.to_string_lossy().into_owned(),
                root: self.path.clone(),
            }),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(Error::auth_failure(self.path.to_string_lossy()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug)]
pub struct LocalBucket {
    name: String,
    root: PathBuf,
}

impl LocalBucket {
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let path = Path::new(key);
        if key.is_empty() || path.components().count() != 1 || path.file_name().is_none() {
            return Err(Error::invalid_path(path));
        }
        Ok(self.root.join(path))
    }

    fn map_io(&self, e: std::io::Error) -> Error {
        match e.kind() {
            ErrorKind::PermissionDenied => Error::auth_failure(self.name.as_str()),
            _ => e.into(),
        }
    }
}

impl ObjectStore for LocalBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(|e| self.map_io(e))? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let key = entry.file_name().to_string_lossy().into_owned();
            if prefix.map_or(true, |prefix| key.starts_with(prefix)) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.object_path(key)?.is_file())
    }

    fn put_file(&self, key: &str, src: &Path) -> Result<()> {
        let dest = self.object_path(key)?;
        std::fs::copy(src, dest).map_err(|e| self.map_io(e))?;
        Ok(())
    }

    fn get_to_file(&self, key: &str, dest: &Path) -> Result<()> {
        let src = self.object_path(key)?;
        if !src.is_file() {
            return Err(Error::not_found(src));
        }
        std::fs::copy(src, dest).map_err(|e| self.map_io(e))?;
        Ok(())
    }
}
