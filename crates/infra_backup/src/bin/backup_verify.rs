//! Backup verification tool
//!
//! Dry-runs the import of a backup file into an empty in-memory store and
//! prints what a real restore would do, so a file can be checked before it
//! is applied.
//!
//! # Usage
//!
//! ```bash
//! backup-verify backups/backup_lar_2025-10-31.csv
//! backup-verify --verbose backups/backup_lar_2025-10-31.csv
//! ```
//!
//! # Environment Variables
//!
//! * `CARE_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: warn)
//! * `RUST_LOG` - Overrides the log level with a full filter directive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::CareConfig;
use infra_backup::{import_from_path, BackupStore, RowTag};

#[derive(Parser)]
#[command(name = "backup-verify", about = "Check a backup file without restoring it")]
struct Args {
    /// Backup file to check
    file: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "CARE_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Also list values that were replaced by defaults
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = CareConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "configuration not loaded, using defaults");
        CareConfig::default()
    });
    tracing::info!(institution = %config.institution_name, file = %args.file.display(), "verifying backup");

    let store = BackupStore::in_memory();
    let report = import_from_path(&store, &args.file)
        .await
        .with_context(|| format!("could not read backup {}", args.file.display()))?;

    println!("{}", args.file.display());
    for tag in RowTag::ALL {
        println!("  {:<9} {:>6}", tag.as_str(), report.inserted.get(tag));
    }
    println!("  {:<9} {:>6}", "TOTAL", report.inserted.total());

    if args.verbose && !report.warnings.is_empty() {
        println!("\n{} values replaced by defaults:", report.warnings.len());
        for warning in &report.warnings {
            println!("  {warning}");
        }
    }

    if report.is_clean() {
        println!("\nOK: every row can be restored");
        return Ok(ExitCode::SUCCESS);
    }

    println!("\n{} rows would be refused:", report.issues.len());
    for issue in &report.issues {
        println!("  {issue}");
    }
    Ok(ExitCode::FAILURE)
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
