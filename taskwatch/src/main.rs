mod cli;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Commands};
use taskwatch::config::{AppConfig, DEFAULT_REQUEST_TIMEOUT, NotionConfig};
use taskwatch::monitor::{IntervalTicker, NotionSource, RecordSource, TaskMonitor};
use taskwatch::utils::http_client;
use taskwatch::{logging, panic_hook};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match &args.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load environment file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    match args.command.unwrap_or(Commands::Run) {
        Commands::Columns => list_columns().await,
        command => watch(&args, command).await,
    }
}

fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::from_env().context("Invalid configuration")?;

    if let Some(secs) = args.interval {
        config.poll_interval = Duration::from_secs(secs);
    }
    if let Some(state) = &args.state {
        config.state_path = state.clone();
    }
    if let Some(log_dir) = &args.log_dir {
        config.log_dir = log_dir.clone();
    }

    Ok(config)
}

async fn watch(args: &Args, command: Commands) -> anyhow::Result<()> {
    let config = load_config(args)?;

    let (logging, _guard) = logging::init_logging(&config.log_dir)?;
    panic_hook::install(logging.log_dir());

    info!(version = env!("CARGO_PKG_VERSION"), ?config, "taskwatch starting");

    let monitor = TaskMonitor::from_config(&config)?;

    if command == Commands::Once {
        let report = monitor.run_cycle().await?;
        info!(
            records = report.records,
            events = report.events,
            delivered = report.delivered,
            failed = report.failed,
            unroutable = report.unroutable,
            persisted = report.persisted,
            "Single poll cycle finished"
        );
        return Ok(());
    }

    let cancel = CancellationToken::new();
    logging.start_retention_cleanup(cancel.child_token());

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                shutdown.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    monitor
        .run(IntervalTicker::new(config.poll_interval), cancel)
        .await;

    info!("taskwatch stopped");
    Ok(())
}

async fn list_columns() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let notion = NotionConfig::from_env().context("Invalid configuration")?;
    let client = notion_source::NotionClient::new(
        http_client::build_client(DEFAULT_REQUEST_TIMEOUT),
        notion.token.clone(),
    )
    .with_api_base(&notion.api_base)?;

    let pages = NotionSource::new(client, notion.database_id.clone())
        .fetch()
        .await?;

    match pages.first() {
        None => println!("No records found in database {}", notion.database_id),
        Some(page) => {
            println!("Columns of the first record ({}):", page.id);
            for (name, kind) in page.property_kinds() {
                println!("  {name} ({kind})");
            }
        }
    }

    Ok(())
}
