//! cms-backup command line
//!
//! Loads a JSON configuration, creates a timestamped run directory and backs
//! up every configured endpoint into it.

use clap::Parser;
use cms_backup::{BackupRunner, BackupStore, BackupSummary, CmsClient, Config, Error};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cms-backup", version)]
#[command(about = "Back up headless CMS contents, optionally split by publication status")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Directory receiving `<serviceId>/<timestamp>/` run directories
    #[arg(short, long, default_value = "backup")]
    output: PathBuf,

    /// Log every request and file write
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "cms_backup=debug"
    } else {
        "cms_backup=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(&cli).await {
        Ok(summary) => {
            log_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, phase = ?e.phase(), "Backup failed");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<BackupSummary, Error> {
    let config = Config::from_file(&cli.config)?;
    let client = CmsClient::new(&config)?;

    let dir = cms_backup::utils::create_run_dir(&cli.output, &config.service_id).await?;
    tracing::info!(
        service = %config.service_id,
        endpoints = config.contents.endpoints.len(),
        dir = %dir.display(),
        "Starting backup"
    );

    BackupRunner::new(&client, &config, BackupStore::new(dir))
        .run()
        .await
}

fn log_summary(summary: &BackupSummary) {
    for endpoint in &summary.endpoints {
        for (bucket, count) in &endpoint.buckets {
            tracing::info!(
                endpoint = %endpoint.endpoint,
                bucket = %bucket,
                records = count,
                "Bucket written"
            );
        }
        if endpoint.skipped > 0 {
            tracing::warn!(
                endpoint = %endpoint.endpoint,
                skipped = endpoint.skipped,
                "Items skipped for unrecognized status"
            );
        }
    }
    tracing::info!(
        endpoints = summary.endpoints.len(),
        records = summary.record_count(),
        files = summary.files_written(),
        "Backup complete"
    );
}
