//! Error types for `scorecard-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown score type discriminant: {0:?}")]
  UnknownScoreType(String),

  #[error("unknown value kind discriminant: {0:?}")]
  UnknownValueKind(String),

  #[error("invalid numeric score value: {0:?}")]
  InvalidNumericValue(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
