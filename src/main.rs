use chrono::Utc;
use clap::{Parser, Subcommand};
use mongo_backup::backup::backup_config::BackupConfig;
use mongo_backup::backup::object_store::{download, list, ObjectStoreConfig};
use mongo_backup::backup::orchestrator::BackupOrchestrator;
use mongo_backup::backup::result_error::error::Error;
use mongo_backup::backup::result_error::result::Result;
use mongo_backup::backup::result_error::AddMsg;
use mongo_backup::backup::shell::ProcessExecutor;
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, info};

/// Back up, restore and ship MongoDB dumps
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Location of config file
    #[arg(short, long, global = true, default_value = "config.yml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single backup now
    Backup,
    /// Restore the database from an archive
    Restore {
        /// Archive to restore
        #[arg(short, long)]
        archive: PathBuf,
        /// Drop each collection before restoring it
        #[arg(long)]
        drop_database: bool,
        /// Keep the unpacked archive after restoring
        #[arg(long)]
        keep_work_dir: bool,
    },
    /// List archives in the object store, oldest first
    List {
        #[arg(short, long)]
        prefix: Option<String>,
    },
    /// Download an archive from the object store, the newest one by default
    Download {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        key: Option<String>,
        #[arg(short, long)]
        prefix: Option<String>,
    },
    /// Back up on the configured cron schedule, forever
    Run,
}

fn object_store(config: &BackupConfig) -> Result<&ObjectStoreConfig> {
    config
        .object_store()
        .as_ref()
        .ok_or_else(|| Error::not_found("object_store").add_msg("No object store configured"))
}

fn run(args: Args) -> Result<()> {
    let config = BackupConfig::load(&args.config)?;
    let orchestrator = BackupOrchestrator::new(ProcessExecutor);

    match args.command {
        Command::Backup => {
            let report = orchestrator.backup(&config, Utc::now())?;
            info!("Backup finished: {:?}", report);
        }
        Command::Restore {
            archive,
            drop_database,
            keep_work_dir,
        } => {
            let drop_database = drop_database || *config.restore().drop_database();
            let cleanup = !keep_work_dir && *config.restore().cleanup();
            orchestrator.restore(&config, archive, drop_database, cleanup)?;
        }
        Command::List { prefix } => {
            let bucket = object_store(&config)?.connect()?;
            let prefix = prefix.as_deref().unwrap_or(config.prefix());
            for key in list(&bucket, Some(prefix))? {
                println!("{key}");
            }
        }
        Command::Download {
            output,
            key,
            prefix,
        } => {
            let bucket = object_store(&config)?.connect()?;
            let prefix = prefix.as_deref().unwrap_or(config.prefix());
            let key = download(&bucket, &output, key.as_deref(), Some(prefix))?;
            info!("Downloaded {key:?} to {:?}", &output);
        }
        Command::Run => config.start_loop(&orchestrator)?,
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        error!("{e}");
        exit(1);
    }
}
