//! Ingestion orchestration for the call-scorecard engine.
//!
//! [`Ingestor`] locates the taxonomy and data sheets of a workbook, upserts
//! the taxonomy, re-reads it from the store, classifies the data-sheet header
//! and upserts one call per data row. It is generic over
//! [`ScoreStore`](scorecard_core::store::ScoreStore) and never touches a
//! concrete backend.
//!
//! Uploads for the same project are serialized by [`ProjectLocks`]; a
//! [`CancelFlag`] stops a run between rows.

mod cancel;
mod locks;
mod orchestrator;

pub mod error;

pub use cancel::CancelFlag;
pub use error::{Error, Result};
pub use locks::ProjectLocks;
pub use orchestrator::{Ingestor, MISSING_CALL_ID};

#[cfg(test)]
mod tests;
