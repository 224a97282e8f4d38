//! `kechita`: serve the dashboard API, load a snapshot, or check the
//! monthly summary cache.
//!
//! Configuration comes from `config.toml` (or `--config <path>`), overridden
//! by `KECHITA_*` environment variables, e.g. `KECHITA_PORT=9000` or
//! `KECHITA_INSIGHTS__API_KEY=sk-...`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use kechita_api::{InsightsClient, consistency::drift_report};
use kechita_core::load::{LoadOptions, load_dataset};
use kechita_server::{ServerConfig, dataset::read_dataset, expand_tilde};
use kechita_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Kechita microfinance dashboard")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API over HTTP.
  Serve,

  /// Replace the store's contents with a directory of JSON or CSV table files.
  Load {
    /// Directory holding `branches.csv`, `loans.csv`, ... (or `.json`).
    dir: PathBuf,

    /// Recompute monthly summaries from the daily rows instead of loading
    /// `monthly_branch_summary`.
    #[arg(long)]
    derive_monthly: bool,

    /// Clear the store even if the dataset turns out to have no rows.
    #[arg(long)]
    allow_empty: bool,

    /// Rows per insert transaction; overrides `batch_size` from the config.
    #[arg(long)]
    batch_size: Option<usize>,
  },

  /// Compare cached monthly summaries with the daily rows and print the
  /// drift report. Exits non-zero when they disagree.
  Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let config = ServerConfig::load(&cli.config).context("failed to read configuration")?;

  let store_path = expand_tilde(&config.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Serve => serve(config, store).await,
    Command::Load {
      dir,
      derive_monthly,
      allow_empty,
      batch_size,
    } => {
      let options = LoadOptions {
        batch_size: batch_size.unwrap_or(config.batch_size),
        derive_monthly,
        allow_empty,
      };
      load(&store, dir, options).await
    }
    Command::Check => check(&store).await,
  }
}

async fn serve(config: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let insights =
    InsightsClient::new(config.insights.clone()).context("failed to build insights client")?;
  if !insights.is_enabled() {
    tracing::info!("no insights API key configured; /api/insights will answer with fallbacks");
  }

  let app = kechita_server::router(Arc::new(store), Arc::new(insights));
  let address = config.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn load(store: &SqliteStore, dir: PathBuf, options: LoadOptions) -> anyhow::Result<()> {
  let dataset = read_dataset(&dir)
    .await
    .with_context(|| format!("failed to read dataset from {dir:?}"))?;

  let report = load_dataset(store, dataset, options)
    .await
    .context("load aborted")?;

  for table in &report.tables {
    tracing::info!(
      table = table.table,
      rows = table.rows,
      batches = table.batches,
      "loaded",
    );
  }
  tracing::info!(rows = report.total_rows(), "load complete");
  Ok(())
}

async fn check(store: &SqliteStore) -> anyhow::Result<()> {
  let report = drift_report(store).await.context("consistency check failed")?;
  println!("{}", serde_json::to_string_pretty(&report)?);
  if !report.consistent {
    std::process::exit(1);
  }
  Ok(())
}
