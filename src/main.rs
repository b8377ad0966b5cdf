mod aggregator;
mod catalog;
mod config;
mod eligibility;
mod engine;
mod explain;
mod models;
mod ranking;
mod rewards;
mod scoring;
mod types;

use std::fs;
use std::io::{stderr, stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tokio::signal;
use tokio::task::spawn_blocking;
use tracing::{info, warn};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::aggregator::read_transactions;
use crate::catalog::{CatalogCache, FileCatalogSource};
use crate::config::EngineConfig;
use crate::engine::{CancellationToken, RecommendationEngine};
use crate::models::{RecommendationCriteria, RecommendationResponse};

#[tokio::main]
async fn main() -> Result<()> {
    //NOTE: Positional arguments keep the CLI scriptable; engine tunables come from the environment
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: card-recommender [transactions].csv [catalog].json [log_level:optional] > [recommendations].json");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        eprintln!("Criteria are read from the JSON file named by RECOMMENDER_CRITERIA_PATH when set");
        exit(1);
    }

    let transactions_path = PathBuf::from(&args[1]);
    let catalog_path = PathBuf::from(&args[2]);
    let log_level = args.get(3)
        .map(|s| parse_log_level(s)).unwrap_or_else(|| LevelFilter::ERROR);

    setup_logging(log_level);

    let config = EngineConfig::from_env()?;
    let criteria = match &config.criteria_path {
        Some(path) => read_criteria(path)?,
        None => RecommendationCriteria::default()
    };

    let timer = Instant::now();

    let transactions = spawn_blocking(move || read_transactions(&transactions_path)).await??;

    let catalog = CatalogCache::new()
        .load(Arc::new(FileCatalogSource::new(catalog_path)))
        .await
        .map_err(|error| anyhow!("{error}"))?;

    let (cancel_handle, cancellation) = CancellationToken::pair();

    //NOTE: Ctrl-C aborts in-flight card evaluation instead of killing the process mid-write
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling recommendation");
            cancel_handle.cancel();
        }
    });

    let engine = RecommendationEngine::new(config);
    let response = engine.recommend(&transactions, catalog, &criteria, cancellation).await?;

    info!("Produced recommendations in: {:?}", timer.elapsed());

    write_response_to_stdout(&response)?;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries the JSON response, so logging goes to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn read_criteria(path: &Path) -> Result<RecommendationCriteria> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Error opening criteria at path: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Error parsing criteria at path: {}", path.display()))
}

fn write_response_to_stdout(response: &RecommendationResponse) -> Result<()> {
    let mut output = BufWriter::new(stdout().lock());

    serde_json::to_writer_pretty(&mut output, response)?;
    writeln!(output)?;
    output.flush()?;

    Ok(())
}
