use crate::backup::result_error::{AddFunctionName, AddMsg};
use std::path::PathBuf;
use thiserror::Error;
use thiserror_ext::Construct;

#[derive(Error, Debug, Construct)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error("Attached storage {0:?} does not exist, create it and re-run")]
    MissingMount(PathBuf),
    #[error("Output directory must be absolute or start with './', got {0:?}")]
    InvalidPath(PathBuf),
    #[error("Invalid cron string: {0:?}")]
    Cron(String),
    #[error("No cron schedule configured, set `cron` to run the scheduling loop")]
    MissingCron,
    #[error("Command line is empty")]
    EmptyCommand,
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },
    #[error("{tool} failed with {} [arguments stripped]", describe_exit(.exit_code))]
    CommandFailure {
        tool: String,
        exit_code: Option<i32>,
    },
    #[error("Dump failed, {tool} exited with {} [arguments stripped]", describe_exit(.exit_code))]
    DumpFailure {
        tool: String,
        exit_code: Option<i32>,
    },
    #[error("Restore failed, {tool} exited with {} [arguments stripped]", describe_exit(.exit_code))]
    RestoreFailure {
        tool: String,
        exit_code: Option<i32>,
    },
    #[error("{0:?} already exists, aborting")]
    AlreadyExists(PathBuf),
    #[error("Object key {0:?} already exists for the current period")]
    DuplicateKey(String),
    #[error("{0:?} is not empty, existing files are never overwritten")]
    NotEmpty(PathBuf),
    #[error("{0:?} does not exist")]
    NotFound(PathBuf),
    #[error("No archive found in bucket {0:?}")]
    EmptyBucket(String),
    #[error("Access to bucket {0:?} denied, check object store credentials")]
    AuthFailure(String),
    #[error("Object store request failed: {0}")]
    ObjectStore(Box<dyn std::error::Error + Send + Sync>),
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{} failed:\n{}", fn_name, indent::indent_all_with("  ", error.to_string()))]
    WithFunctionName { fn_name: String, error: Box<Error> },
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl<S: Into<String>> AddMsg<S> for Error {
    fn add_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl<S: Into<String>> AddFunctionName<S> for Error {
    fn add_fn_name(self, fn_name: S) -> Self {
        Self::WithFunctionName {
            fn_name: fn_name.into(),
            error: Box::new(self),
        }
    }
}

impl Error {
    /// Strips `WithMsg`/`WithFunctionName` context and returns the underlying error
    pub fn root(&self) -> &Error {
        match self {
            Error::WithMsg { error, .. } | Error::WithFunctionName { error, .. } => error.root(),
            e => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::from(io_error);

        match error {
            Error::Io(_) => (),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_add_msg() {
        let error = Error::not_found("/tmp/missing.tbz").add_msg("Restore aborted");

        match &error {
            Error::WithMsg { msg, .. } => assert_eq!(msg, "Restore aborted"),
            _ => panic!("Expected WithMsg error"),
        }
        let error_str = error.to_string();
        assert!(error_str.contains("Restore aborted"));
        assert!(error_str.contains("missing.tbz"));
    }

    #[test]
    fn test_error_add_fn_name() {
        let error = Error::EmptyCommand.add_fn_name("mongo_backup::shell::run");
        let error_str = error.to_string();

        assert!(error_str.contains("mongo_backup::shell::run failed"));
        assert!(error_str.contains("Command line is empty"));
    }

    #[test]
    fn test_root_unwraps_context() {
        let error = Error::duplicate_key("backup_2024-03-05_02-07.tbz")
            .add_msg("Upload failed")
            .add_fn_name("upload");

        assert!(matches!(error.root(), Error::DuplicateKey(key) if key == "backup_2024-03-05_02-07.tbz"));
    }

    #[test]
    fn test_spawn_display() {
        let error = Error::spawn(std::io::Error::from(std::io::ErrorKind::NotFound), "mongodump");
        assert!(matches!(&error, Error::Spawn { tool, .. } if tool == "mongodump"));
        assert!(error.to_string().starts_with("Failed to start mongodump"));
    }

    #[test]
    fn test_command_failure_display() {
        let error = Error::command_failure("tar", Some(2));
        assert_eq!(error.to_string(), "tar failed with exit code 2 [arguments stripped]");

        let error = Error::dump_failure("mongodump", None::<i32>);
        assert!(error.to_string().contains("terminated by signal"));
    }
}
