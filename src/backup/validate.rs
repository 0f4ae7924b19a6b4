//! Validation functions for configuration values.

use chrono::Utc;
use sanitize_filename::{is_sanitized, sanitize};
use validator::ValidationError;

use std::path::Path;

pub fn validate_valid_archive_prefix<S: AsRef<str>>(name: S) -> Result<(), ValidationError> {
    let name = name.as_ref();
    if !is_sanitized(name) {
        return Err(ValidationError::new("InvalidArchivePrefix").with_message(
            format!("Invalid file name prefix, try sanitizing like {:?}", sanitize(name)).into(),
        ));
    }

    Ok(())
}

pub fn validate_dir_exist<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ValidationError::new("InvalidDirectory")
                .with_message(format!("{:?} is not a directory", dir).into()));
        }
    } else {
        return Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("{:?} not found", dir).into()));
    }

    Ok(())
}

pub fn validate_cron_str<S: AsRef<str>>(cron: S) -> Result<(), ValidationError> {
    let cron = cron.as_ref();
    if cron_parser::parse(cron, &Utc::now()).is_err() {
        return Err(ValidationError::new("InvalidCron")
            .with_message(format!("Invalid cron string: {cron:?}").into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_valid_archive_prefix() {
        assert!(validate_valid_archive_prefix("backup").is_ok());
        assert!(validate_valid_archive_prefix("mongo-prod_eu").is_ok());
        assert!(validate_valid_archive_prefix("a/b").is_err());
        assert!(validate_valid_archive_prefix("a\0b").is_err());
    }

    #[test]
    fn test_validate_dir_exist() {
        let tmp = TempDir::new().unwrap();
        assert!(validate_dir_exist(tmp.path()).is_ok());
        assert!(validate_dir_exist(tmp.path().join("missing")).is_err());

        let file = tmp.path().join("file");
        std::fs::write(&file, b"").unwrap();
        assert!(validate_dir_exist(&file).is_err());
    }

    #[test]
    fn test_validate_cron_str() {
        assert!(validate_cron_str("0 3 * * *").is_ok());
        assert!(validate_cron_str("*/15 * * * *").is_ok());
        assert!(validate_cron_str("not a cron").is_err());
    }
}
