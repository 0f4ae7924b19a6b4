//! Archive naming convention.
//!
//! Archives are named `<prefix>_YYYY-MM-DD_HH-MM.<ext>` in UTC with minute
//! resolution. The name is the only place a backup's creation time is recorded,
//! so purge and restore depend on it parsing back to the same instant.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use thiserror::Error;

/// `strftime` pattern appended to the prefix
pub static TIME_FORMAT: &str = "_%Y-%m-%d_%H-%M";

/// Why a file name is not an archive of a given prefix
///
/// Stray files in a backup directory are expected, so callers match on this
/// to skip them instead of failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("{file_name:?} does not start with prefix {prefix:?}")]
    PrefixMismatch { file_name: String, prefix: String },
    #[error("{file_name:?} does not match naming convention <prefix>_YYYY-MM-DD_HH-MM")]
    TimestampMismatch { file_name: String },
}

/// Builds and parses archive names for one prefix
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveNamer {
    prefix: String,
}

impl ArchiveNamer {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `prefix` followed by the formatted minute of `instant`, without extension
    pub fn make_name(&self, instant: DateTime<Utc>) -> String {
        format!("{}{}", self.prefix, format_timestamp(instant))
    }

    /// Recovers the instant encoded by [`ArchiveNamer::make_name`]
    ///
    /// Everything after the first `.` is treated as the extension and ignored.
    pub fn parse_name(&self, file_name: &str) -> Result<DateTime<Utc>, NamingError> {
        let rest = file_name
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| NamingError::PrefixMismatch {
                file_name: file_name.to_string(),
                prefix: self.prefix.clone(),
            })?;
        let segment = rest.split_once('.').map_or(rest, |(segment, _)| segment);

        let mismatch = || NamingError::TimestampMismatch {
            file_name: file_name.to_string(),
        };
        let instant = NaiveDateTime::parse_from_str(segment, TIME_FORMAT)
            .map_err(|_| mismatch())?
            .and_utc();

        // chrono accepts unpadded fields, the convention does not
        if format_timestamp(instant) != segment {
            return Err(mismatch());
        }

        Ok(instant)
    }
}

pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIME_FORMAT).to_string()
}

/// Drops seconds and sub-seconds
pub fn truncate_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_second(0)
        .and_then(|dt| dt.with_nanosecond(0))
        .unwrap_or(instant)
}
