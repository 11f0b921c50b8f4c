//! Codevault backup job binary.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use codevault_git::GitFetcher;
use codevault_job::{BackupJob, Settings};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "codevault-job",
    version,
    about = "Clone a repository reference, archive it and upload the archive",
    long_about = "Backs up one repository reference per invocation.\n\
                  Inputs come from the job environment (REPOSITORY_NAME, REFERENCE_NAME,\n\
                  COMMIT_ID, REPO_REGION, BACKUP_BUCKET_NAME, ...) or from a trigger event."
)]
struct Cli {
    /// Read a trigger event from this file ('-' for stdin) instead of the job environment
    #[arg(long, value_name = "FILE")]
    event: Option<PathBuf>,

    /// Settings file, layered under the environment
    #[arg(long, env = "CODEVAULT_CONFIG", default_value = "codevault.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Backup failed: {:#}", e);
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("Starting Codevault job v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::from_sources(Some(cli.config.as_path()), None)?;
    if let Some(bus) = &settings.event_bus_name {
        tracing::debug!("Triggered from event bus {}", bus);
    }

    let request = match &cli.event {
        Some(source) => match settings.request_from_event(&read_event(source)?)? {
            Some(request) => request,
            None => return Ok(()),
        },
        None => settings.request().context("reading job inputs")?,
    };

    let target = settings.store_target()?;
    tracing::info!("Backing up {} to {}", request, target);

    let store = target.open(settings.sse()?).await?;
    let fetcher = Arc::new(GitFetcher::new(settings.fetch_config()?));
    let job = BackupJob::new(fetcher, store)
        .with_retention(settings.retention())
        .with_work_root(settings.work_dir.clone());

    let outcome = job.run(&request).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}

/// Reads a trigger event from `source`, or stdin for `-`.
fn read_event(source: &Path) -> anyhow::Result<String> {
    if source.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading event from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("reading event from {}", source.display()))
    }
}
