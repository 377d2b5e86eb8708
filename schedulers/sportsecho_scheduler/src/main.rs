use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sportsecho_scheduler::{
    api_client::HttpFixturesFetcher,
    config::SchedulerConfig,
    fixture_store::MySqlFixtureStore,
    metrics::MetricsCollector,
    scheduler::{build_scheduler, run_cycle, Operation},
    season::calculate_season,
    sync_job::{now_in_seoul, FixtureSyncJob, SyncDeps},
    types::Sport,
    watermark::WatermarkStore,
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every sync job on its schedule until Ctrl-C (default)
    Run,
    /// Refresh today's scores once
    UpdateScores {
        #[arg(value_enum)]
        sport: Sport,
    },
    /// Insert upcoming fixtures once
    FetchUpcoming {
        #[arg(value_enum)]
        sport: Sport,
    },
    /// Print the season label the API expects
    Season {
        /// League code: NBA, EPL or MLB
        league: String,
        /// Date as yyyy-mm-dd, defaults to today in Asia/Seoul
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

type Deps = SyncDeps<HttpFixturesFetcher, MySqlFixtureStore>;

fn load_config() -> Result<SchedulerConfig> {
    let config = SchedulerConfig::from_env().context("Invalid configuration")?;
    info!("Loaded configuration: {:?}", config);
    Ok(config)
}

async fn connect(config: &SchedulerConfig, metrics: &MetricsCollector) -> Result<Deps> {
    let store = MySqlFixtureStore::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    let watermarks = WatermarkStore::s3(&config.storage.bucket)
        .with_context(|| format!("Failed to open bucket {}", config.storage.bucket))?;

    Ok(SyncDeps {
        fetcher: Arc::new(HttpFixturesFetcher::new(config.api.clone(), metrics.clone())),
        store: Arc::new(store),
        watermarks,
        metrics: metrics.clone(),
        config: config.sync.clone(),
    })
}

async fn run_once(config: &SchedulerConfig, sport: Sport, operation: Operation) -> Result<()> {
    let metrics = MetricsCollector::new();
    let deps = connect(config, &metrics).await?;
    let job = FixtureSyncJob::new(sport, deps);

    let summary = run_cycle(&job, operation, &metrics).await?;
    println!(
        "{} {}: {} games seen, {} rows updated, {} inserted, {} skipped",
        sport,
        operation.name(),
        summary.fixtures_seen,
        summary.rows_updated,
        summary.rows_inserted,
        summary.rows_skipped
    );
    Ok(())
}

async fn run_scheduler(config: &SchedulerConfig) -> Result<()> {
    let metrics = MetricsCollector::new();
    let deps = connect(config, &metrics).await?;
    let jobs = Sport::ALL
        .iter()
        .map(|sport| Arc::new(FixtureSyncJob::new(*sport, deps.clone())))
        .collect();

    let mut scheduler = build_scheduler(jobs, metrics.clone())
        .await
        .context("Failed to start scheduler")?;
    info!("Scheduler running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    scheduler.shutdown().await.context("Failed to stop scheduler")?;
    metrics.log_summary();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_scheduler(&load_config()?).await,
        Commands::UpdateScores { sport } => {
            run_once(&load_config()?, sport, Operation::UpdateScores).await
        }
        Commands::FetchUpcoming { sport } => {
            run_once(&load_config()?, sport, Operation::FetchUpcoming).await
        }
        Commands::Season { league, date } => {
            let date = date.unwrap_or_else(|| now_in_seoul().date());
            println!("{}", calculate_season(&league, date)?);
            Ok(())
        }
    }
}
