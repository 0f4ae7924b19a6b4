use crate::backup::archiver::{pack, unpack};
use crate::backup::backup_config::BackupConfig;
use crate::backup::function_path;
use crate::backup::object_store::{upload, ObjectStore};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddFunctionName;
use crate::backup::retention::purge_old_files;
use crate::backup::shell::{CommandExecutor, ShellRunner};
use chrono::{DateTime, Utc};
use function_name::named;
use getset::Getters;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a backup run produced
#[derive(Clone, Debug, Default, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct BackupReport {
    archive: PathBuf,
    attached_copy: Option<PathBuf>,
    uploaded_key: Option<String>,
    purged: Vec<PathBuf>,
}

/// Drives the backup and restore pipelines, one step after the other
///
/// Every step is fatal on failure except non-conforming file names found while
/// purging, which are only logged.
#[derive(Debug)]
pub struct BackupOrchestrator<E> {
    shell: ShellRunner<E>,
}

impl<E: CommandExecutor> BackupOrchestrator<E> {
    pub fn new(executor: E) -> Self {
        Self {
            shell: ShellRunner::new(executor),
        }
    }

    pub fn shell(&self) -> &ShellRunner<E> {
        &self.shell
    }

    /// Dump, pack, distribute, purge and clean up, stamped with `now`
    #[named]
    pub fn backup(&self, config: &BackupConfig, now: DateTime<Utc>) -> Result<BackupReport> {
        self.run_backup(config, now).add_fn_name(function_path!())
    }

    fn run_backup(&self, config: &BackupConfig, now: DateTime<Utc>) -> Result<BackupReport> {
        if let Some(attached_dir) = config.attached_dir() {
            if !attached_dir.is_dir() {
                return Err(Error::missing_mount(attached_dir));
            }
        }

        config.mongo().dump(&self.shell, config.dump_dir())?;

        let namer = config.namer();
        let archive = pack(
            &self.shell,
            config.dump_dir(),
            config.local_backup_dir().join(namer.make_name(now)),
        )?;
        info!("Created backup file: {:?}", &archive);

        let mut report = BackupReport {
            archive,
            ..BackupReport::default()
        };

        if let Some(attached_dir) = config.attached_dir() {
            report.attached_copy = Some(copy_to_dir(&report.archive, attached_dir)?);
        }

        if let Some(store_config) = config.object_store() {
            let bucket = store_config.connect()?;
            let key = upload(&bucket, &report.archive)?;
            info!("Uploaded {key:?} to bucket {:?}", bucket.name());
            report.uploaded_key = Some(key);
        }

        if let Some(retention) = config.local_retention() {
            report.purged.extend(purge_old_files(
                config.local_backup_dir(),
                &namer,
                retention.cutoff(now),
            )?);
        }
        if let (Some(attached_dir), Some(retention)) =
            (config.attached_dir(), config.attached_retention())
        {
            report.purged.extend(purge_old_files(
                attached_dir,
                &namer,
                retention.cutoff(now),
            )?);
        }

        if *config.cleanup() {
            remove_dir_if_exists(config.dump_dir())?;
        }

        Ok(report)
    }

    /// Unpacks `archive` into the configured work directory and restores it
    #[named]
    pub fn restore<P: AsRef<Path>>(
        &self,
        config: &BackupConfig,
        archive: P,
        drop_database: bool,
        cleanup: bool,
    ) -> Result<()> {
        self.run_restore(config, archive.as_ref(), drop_database, cleanup)
            .add_fn_name(function_path!())
    }

    fn run_restore(
        &self,
        config: &BackupConfig,
        archive: &Path,
        drop_database: bool,
        cleanup: bool,
    ) -> Result<()> {
        if !archive.is_file() {
            return Err(Error::not_found(archive));
        }

        let work_dir = unpack(&self.shell, archive, config.restore().work_dir())?;
        config.mongo().restore(&self.shell, &work_dir, drop_database)?;
        info!("Restored {:?}", archive);

        if cleanup {
            remove_dir_if_exists(&work_dir)?;
        }
        Ok(())
    }
}

fn copy_to_dir(file: &Path, dir: &Path) -> Result<PathBuf> {
    let file_name = file.file_name().ok_or_else(|| Error::not_found(file))?;
    let dest = dir.join(file_name);
    if dest.exists() {
        return Err(Error::already_exists(dest));
    }
    info!("Copying {:?} to {:?}", file, &dest);
    std::fs::copy(file, &dest)?;
    Ok(dest)
}

fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    if dir.exists() {
        info!("Removing {:?}", dir);
        std::fs::remove_dir_all(dir)?;
    }
    Ok(())
}
