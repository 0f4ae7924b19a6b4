use crate::backup::mongo::MongoConfig;
use crate::backup::naming::ArchiveNamer;
use crate::backup::object_store::ObjectStoreConfig;
use crate::backup::orchestrator::BackupOrchestrator;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddMsg;
use crate::backup::retention::{scan_archives, RetentionWindow};
use crate::backup::shell::CommandExecutor;
use crate::backup::validate::{validate_cron_str, validate_valid_archive_prefix};
use bon::Builder;
use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;
use validator::Validate;

#[skip_serializing_none]
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Builder, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct BackupConfig {
    #[validate(custom(function = validate_valid_archive_prefix))]
    #[serde(default = "default_prefix")]
    #[builder(default = default_prefix(), into)]
    prefix: String,
    #[builder(into)]
    local_backup_dir: PathBuf,
    #[builder(into)]
    attached_dir: Option<PathBuf>,
    #[serde(default = "default_dump_dir")]
    #[builder(default = default_dump_dir(), into)]
    dump_dir: PathBuf,
    #[validate(range(min = 1))]
    purge_local_days: Option<u32>,
    #[validate(range(min = 1))]
    purge_attached_days: Option<u32>,
    #[serde(default = "default_true")]
    #[builder(default = true)]
    cleanup: bool,
    #[validate(custom(function = validate_cron_str))]
    #[builder(into)]
    cron: Option<String>,
    #[validate(nested)]
    mongo: MongoConfig,
    #[validate(nested)]
    #[builder(into)]
    object_store: Option<ObjectStoreConfig>,
    #[validate(nested)]
    #[serde(default)]
    #[builder(default)]
    restore: RestoreConfig,
}

/// Defaults for the `restore` command
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Builder, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct RestoreConfig {
    #[serde(default = "default_work_dir")]
    #[builder(default = default_work_dir(), into)]
    work_dir: PathBuf,
    #[serde(default)]
    #[builder(default)]
    drop_database: bool,
    #[serde(default = "default_true")]
    #[builder(default = true)]
    cleanup: bool,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_prefix() -> String {
    "backup".to_string()
}

fn default_dump_dir() -> PathBuf {
    PathBuf::from("/tmp/mongo_dump")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("/tmp/mongo_restore")
}

fn default_true() -> bool {
    true
}

impl BackupConfig {
    /// Reads and validates a YAML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config: BackupConfig = File::open(path)
            .map_err(Error::from)
            .and_then(|f| serde_yml::from_reader(f).map_err(Error::from))
            .add_msg(format!("Parse YAML config failed: {path:?}"))?;
        config
            .validate()
            .map_err(Error::from)
            .add_msg(format!("Config validation failed: {path:?}"))?;
        Ok(config)
    }

    pub fn namer(&self) -> ArchiveNamer {
        ArchiveNamer::new(self.prefix.as_str())
    }

    pub fn local_retention(&self) -> Option<RetentionWindow> {
        self.purge_local_days.map(RetentionWindow::days)
    }

    /// Only meaningful when an attached directory is configured
    pub fn attached_retention(&self) -> Option<RetentionWindow> {
        self.attached_dir
            .as_ref()
            .and(self.purge_attached_days)
            .map(RetentionWindow::days)
    }

    /// Instant of the newest conforming archive in the local backup directory
    pub fn latest_local_backup(&self) -> Result<Option<DateTime<Utc>>> {
        if !self.local_backup_dir.is_dir() {
            return Ok(None);
        }
        let (archives, _) = scan_archives(&self.local_backup_dir, &self.namer())?;
        Ok(archives.last().map(|archive| archive.created))
    }

    /// Next cron fire time strictly after `after`
    pub fn next_run(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let cron = self.cron.as_deref().ok_or(Error::MissingCron)?;
        cron_parser::parse(cron, &after).map_err(|_| Error::cron(cron))
    }

    /// Runs a backup on every cron tick, forever
    ///
    /// The first tick is computed from the newest local archive, so a run that
    /// was missed while the process was down happens immediately. Only returns
    /// on error.
    pub fn start_loop<E: CommandExecutor>(&self, orchestrator: &BackupOrchestrator<E>) -> Result<()> {
        let start = self
            .latest_local_backup()?
            .unwrap_or(DateTime::UNIX_EPOCH);
        let mut next = self.next_run(start)?;
        loop {
            let now = Utc::now();
            if now < next {
                info!("Sleeping until {next}");
                std::thread::sleep((next - now).to_std().unwrap_or_default());
            } else {
                info!("Trying to create backup...");
                let report = orchestrator.backup(self, now)?;
                info!("Backup finished: {:?}", report.archive());
                next = self.next_run(now)?;
            }
        }
    }
}
