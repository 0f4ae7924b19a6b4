//! `mongodump` / `mongorestore` invocations.

use crate::backup::redacted::RedactedString;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::shell::{CommandExecutor, ShellRunner};
use bon::Builder;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::Path;
use validator::Validate;

/// Database credentials and the tools used to dump and restore
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct MongoConfig {
    #[validate(length(min = 1))]
    #[builder(into)]
    username: String,
    #[validate(nested)]
    #[builder(into)]
    password: RedactedString,
    #[serde(default = "default_dump_tool")]
    #[builder(default = default_dump_tool(), into)]
    dump_tool: String,
    #[serde(default = "default_restore_tool")]
    #[builder(default = default_restore_tool(), into)]
    restore_tool: String,
}

fn default_dump_tool() -> String {
    "mongodump".to_string()
}

fn default_restore_tool() -> String {
    "mongorestore".to_string()
}

impl MongoConfig {
    /// Dumps every database into `dump_dir`, removing whatever was there first
    pub fn dump<E: CommandExecutor, P: AsRef<Path>>(
        &self,
        shell: &ShellRunner<E>,
        dump_dir: P,
    ) -> Result<()> {
        let dump_dir = dump_dir.as_ref();
        if dump_dir.exists() {
            tracing::info!("Removing previous dump {:?}", dump_dir);
            std::fs::remove_dir_all(dump_dir)?;
        }

        tracing::info!("Dumping database into {:?}", dump_dir);
        shell
            .run([
                OsString::from(&self.dump_tool),
                "--username".into(),
                (&self.username).into(),
                "--password".into(),
                self.password.inner().into(),
                "--out".into(),
                dump_dir.into(),
            ])
            .map_err(|e| match e {
                Error::CommandFailure { tool, exit_code } => Error::dump_failure(tool, exit_code),
                e => e,
            })
    }

    /// Restores the dump found in `source_dir`
    ///
    /// With `drop_database` the live collections are dropped before each one is
    /// restored.
    pub fn restore<E: CommandExecutor, P: AsRef<Path>>(
        &self,
        shell: &ShellRunner<E>,
        source_dir: P,
        drop_database: bool,
    ) -> Result<()> {
        let source_dir = source_dir.as_ref();
        if !source_dir.exists() {
            return Err(Error::not_found(source_dir));
        }

        let mut argv = vec![
            OsString::from(&self.restore_tool),
            "--verbose".into(),
            "--username".into(),
            (&self.username).into(),
            "--password".into(),
            self.password.inner().into(),
        ];
        if drop_database {
            tracing::warn!("Dropping the running database before restoring {:?}", source_dir);
            argv.push("--drop".into());
        }
        argv.push(source_dir.into());

        tracing::info!("Restoring database from {:?}", source_dir);
        shell.run(argv).map_err(|e| match e {
            Error::CommandFailure { tool, exit_code } => Error::restore_failure(tool, exit_code),
            e => e,
        })
    }
}
