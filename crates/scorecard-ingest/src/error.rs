//! Fatal ingestion errors.
//!
//! Anything in here aborts the run before a single data row is committed.
//! Row-scoped problems end up in
//! [`IngestionResult::row_errors`](scorecard_core::report::IngestionResult)
//! instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Sheet(#[from] scorecard_sheet::Error),

  #[error("taxonomy sheet {sheet:?} defines no criteria")]
  EmptyTaxonomy { sheet: String },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
