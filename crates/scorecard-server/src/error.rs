//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// The body could not be read as a workbook at all.
  #[error("unreadable workbook: {0}")]
  Workbook(#[source] scorecard_sheet::Error),

  #[error(transparent)]
  Ingest(#[from] scorecard_ingest::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("workbook decoding task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::BadRequest(_) | Error::Workbook(_) => StatusCode::BAD_REQUEST,
      Error::Ingest(scorecard_ingest::Error::Store(_)) | Error::Store(_) | Error::Task(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      Error::Ingest(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    if status.is_server_error() {
      tracing::error!("{self}");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
