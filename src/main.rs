use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reviewtrail::app::{RunOutcome, RunSettings, run};
use reviewtrail::azure::{AzureDevOpsClient, auth};
use reviewtrail::error::FetchError;
use reviewtrail::util::config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "reviewtrail",
    version,
    about = "Report the Azure DevOps pull requests you voted on"
)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Organization URL, e.g. https://dev.azure.com/my-org
    #[arg(long)]
    org_url: Option<String>,

    #[arg(short, long)]
    project: Option<String>,

    #[arg(short, long)]
    repository: Option<String>,

    /// How many days back to look (default 32)
    #[arg(long)]
    days: Option<u32>,

    /// Pull requests requested per page (default 500)
    #[arg(long)]
    page_size: Option<u32>,

    /// Directory the report is written to (default: current directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Enable debug logging to file
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(url) = &self.org_url {
            config.azure.org_url = Some(url.clone());
        }
        if let Some(project) = &self.project {
            config.azure.project = Some(project.clone());
        }
        if let Some(repository) = &self.repository {
            config.azure.repository = Some(repository.clone());
        }
        if let Some(days) = self.days {
            config.report.lookback_days = days;
        }
        if let Some(page_size) = self.page_size {
            config.report.page_size = page_size;
        }
        if let Some(dir) = &self.output_dir {
            config.report.output_dir = Some(dir.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    let _guard = setup_logging(&config, cli.debug)?;

    info!("reviewtrail starting");

    let settings = match RunSettings::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let token = match auth::resolve_token(config.azure.token.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Authentication error: {e}");
            std::process::exit(1);
        }
    };

    let client = AzureDevOpsClient::new(&token, &settings.org_url)?;

    let identity = match client.fetch_identity().await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Failed to authenticate with Azure DevOps: {e}");
            eprintln!("Please check your token and try again.");
            std::process::exit(1);
        }
    };

    info!(id = %identity.id, "Authenticated as {}", identity.display_name);

    client.verify_target(&settings.repo).await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    match run(&client, &settings, &identity.id, Utc::now(), &cancel).await {
        Ok(RunOutcome::NothingToReport) => println!("No reviews found"),
        Ok(RunOutcome::Saved(path)) => println!("Report saved to {}", path.display()),
        Err(e) if e.downcast_ref::<FetchError>().is_some_and(FetchError::is_cancelled) => {
            eprintln!("Cancelled");
            std::process::exit(130);
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

fn setup_logging(
    config: &AppConfig,
    debug: bool,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    if !debug {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("reviewtrail=warn")),
            )
            .with_target(false)
            .init();
        return Ok(None);
    }

    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "reviewtrail.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter("reviewtrail=debug")
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}
