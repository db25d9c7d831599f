//! HTTP upload surface for the scorecard ingestion engine.
//!
//! Exposes an axum [`Router`] that accepts workbook uploads per project and
//! serves the resulting taxonomy, backed by any [`ScoreStore`].

pub mod error;
pub mod projects;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use scorecard_core::store::ScoreStore;
use scorecard_ingest::Ingestor;
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/scorecard/scorecard.db") }

fn default_max_upload_bytes() -> usize { 32 * 1024 * 1024 }

fn default_max_reported_row_errors() -> usize { 20 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `SCORECARD_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                    String,
  #[serde(default = "default_port")]
  pub port:                    u16,
  #[serde(default = "default_store_path")]
  pub store_path:              PathBuf,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes:        usize,
  /// How many row errors an upload response lists before truncating.
  #[serde(default = "default_max_reported_row_errors")]
  pub max_reported_row_errors: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                    default_host(),
      port:                    default_port(),
      store_path:              default_store_path(),
      max_upload_bytes:        default_max_upload_bytes(),
      max_reported_row_errors: default_max_reported_row_errors(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub ingestor: Ingestor<S>,
  pub config:   Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      ingestor: self.ingestor.clone(),
      config:   self.config.clone(),
    }
  }
}

impl<S: ScoreStore> AppState<S> {
  pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
    Self {
      ingestor: Ingestor::new(store),
      config:   Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the upload server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ScoreStore + 'static,
{
  let body_limit = state.config.max_upload_bytes;
  Router::new()
    .route("/projects/{project_id}/uploads",  post(projects::upload::<S>))
    .route("/projects/{project_id}/criteria", get(projects::criteria::<S>))
    .layer(DefaultBodyLimit::max(body_limit))
    .with_state(state)
}
