use crate::backup::naming::{truncate_to_minute, ArchiveNamer, NamingError};
use crate::backup::result_error::result::Result;
use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use std::path::{Path, PathBuf};

/// Keeps archives younger than a number of days
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionWindow {
    days: u32,
}

impl RetentionWindow {
    pub fn days(days: u32) -> Self {
        Self { days }
    }

    /// `now` truncated to the minute, minus the retention
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        truncate_to_minute(now) - Duration::days(i64::from(self.days))
    }
}

/// An archive file together with the instant encoded in its name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatedArchive {
    pub path: PathBuf,
    pub created: DateTime<Utc>,
}

/// Parses the name of every regular file in `dir`, sorted by creation time
///
/// Files that don't follow the naming convention come back as the
/// `NamingError` explaining why.
pub fn scan_archives<P: AsRef<Path>>(
    dir: P,
    namer: &ArchiveNamer,
) -> Result<(Vec<DatedArchive>, Vec<NamingError>)> {
    let mut archives = Vec::new();
    let mut mismatches = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        match namer.parse_name(&entry.file_name().to_string_lossy()) {
            Ok(created) => archives.push(DatedArchive {
                path: entry.path(),
                created,
            }),
            Err(e) => mismatches.push(e),
        }
    }

    let archives = archives
        .into_iter()
        .sorted_by(|a, b| a.created.cmp(&b.created).then_with(|| a.path.cmp(&b.path)))
        .collect();
    Ok((archives, mismatches))
}

/// Deletes every archive in `dir` created strictly before `cutoff`
///
/// Non-conforming files are logged and left alone. Returns the deleted paths.
pub fn purge_old_files<P: AsRef<Path>>(
    dir: P,
    namer: &ArchiveNamer,
    cutoff: DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let (archives, mismatches) = scan_archives(dir, namer)?;
    for mismatch in mismatches {
        tracing::warn!("Skipping file in {:?}: {mismatch}", dir);
    }

    let mut removed = Vec::new();
    for archive in archives.into_iter().filter(|a| a.created < cutoff) {
        tracing::info!("Removing out of retention file {:?}", &archive.path);
        std::fs::remove_file(&archive.path)?;
        removed.push(archive.path);
    }
    Ok(removed)
}
