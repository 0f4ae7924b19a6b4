//! # mongo_backup
//!
//! Scheduled MongoDB backups with local retention and off-site copies.
//!
//! ## Features
//!
//! - **Dump & Pack**: `mongodump` into a staging directory, packed as `<prefix>_YYYY-MM-DD_HH-MM.tbz`
//! - **Distribution**: optional copy to an attached mount and upload to an S3 compatible bucket
//! - **Retention Management**: age based purge of the local and attached directories
//! - **Restore**: unpack an archive and feed it to `mongorestore`, optionally dropping collections
//! - **Scheduled Backups**: Cron-based automation
//!
//! ## Quick Start
//!
//! ```no_run
//! use mongo_backup::backup::backup_config::BackupConfig;
//! use mongo_backup::backup::orchestrator::BackupOrchestrator;
//! use mongo_backup::backup::shell::ProcessExecutor;
//!
//! // Load and validate configuration from YAML file
//! let config = BackupConfig::load("config.yml")?;
//!
//! // Start the backup daemon
//! config.start_loop(&BackupOrchestrator::new(ProcessExecutor))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;
