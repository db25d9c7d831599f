//! scorecard upload server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store and serves the upload API over HTTP.
//!
//! # One-shot ingestion
//!
//! To ingest a single workbook from disk and print the report:
//!
//! ```text
//! cargo run -p scorecard-server --bin server -- \
//!   --ingest scorecard.xlsx --project 6f1c0e2a-2c1e-4f55-9a57-0d5c2b8f1e11
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use scorecard_server::{AppState, ServerConfig};
use scorecard_sheet::{MemoryWorkbook, XlsxWorkbook};
use scorecard_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Call scorecard upload server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Ingest this workbook (`.xlsx`, or `.json` in the in-memory layout),
  /// print the report and exit.
  #[arg(long, requires = "project")]
  ingest: Option<PathBuf>,

  /// Project the `--ingest` workbook belongs to.
  #[arg(long)]
  project: Option<Uuid>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("SCORECARD"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AppState::new(Arc::new(store), server_cfg.clone());

  if let (Some(path), Some(project)) = (cli.ingest, cli.project) {
    return ingest_file(&state, &path, project).await;
  }

  let app = scorecard_server::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Run one workbook from disk through the ingestor and print the report.
async fn ingest_file(
  state: &AppState<SqliteStore>,
  path: &Path,
  project: Uuid,
) -> anyhow::Result<()> {
  let is_json = path
    .extension()
    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

  let report = if is_json {
    let bytes = std::fs::read(path)
      .with_context(|| format!("failed to read {path:?}"))?;
    let workbook = MemoryWorkbook::from_json(&bytes)
      .with_context(|| format!("failed to parse {path:?}"))?;
    state.ingestor.ingest(project, &workbook).await?
  } else {
    let workbook = XlsxWorkbook::open(path)
      .with_context(|| format!("failed to open {path:?}"))?;
    state.ingestor.ingest(project, &workbook).await?
  };

  let report = report.truncated(state.config.max_reported_row_errors);
  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
