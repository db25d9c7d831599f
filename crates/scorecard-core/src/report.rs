//! Upsert outcomes and the per-run ingestion report.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Upserts ─────────────────────────────────────────────────────────────────

/// What an idempotent upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
  Created,
  Updated,
  /// The stored record already matched; nothing was written.
  Unchanged,
}

/// The id of the upserted record together with the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upserted {
  pub id:      Uuid,
  pub outcome: UpsertOutcome,
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// A data row that could not be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
  /// 1-based row number in the data sheet.
  pub row_number: usize,
  pub reason:     String,
}

/// Aggregated counts for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionResult {
  pub groups_created:          usize,
  pub groups_updated:          usize,
  pub criteria_created:        usize,
  pub criteria_updated:        usize,
  pub calls_created:           usize,
  pub calls_updated:           usize,
  pub calls_skipped_duplicate: usize,
  pub row_errors:              Vec<RowError>,
  /// Non-fatal diagnostics (duplicate criteria, unmapped columns, …).
  pub warnings:                Vec<String>,
  /// Set when the run was cancelled between rows.
  pub cancelled:               bool,
}

impl IngestionResult {
  pub fn record_group(&mut self, outcome: UpsertOutcome) {
    match outcome {
      UpsertOutcome::Created => self.groups_created += 1,
      UpsertOutcome::Updated => self.groups_updated += 1,
      UpsertOutcome::Unchanged => {}
    }
  }

  pub fn record_criterion(&mut self, outcome: UpsertOutcome) {
    match outcome {
      UpsertOutcome::Created => self.criteria_created += 1,
      UpsertOutcome::Updated => self.criteria_updated += 1,
      UpsertOutcome::Unchanged => {}
    }
  }

  pub fn record_call(&mut self, outcome: UpsertOutcome) {
    match outcome {
      UpsertOutcome::Created => self.calls_created += 1,
      UpsertOutcome::Updated => self.calls_updated += 1,
      UpsertOutcome::Unchanged => self.calls_skipped_duplicate += 1,
    }
  }

  pub fn row_error(&mut self, row_number: usize, reason: impl Into<String>) {
    self.row_errors.push(RowError {
      row_number,
      reason: reason.into(),
    });
  }

  /// Number of data rows that reached the store.
  pub fn calls_processed(&self) -> usize {
    self.calls_created + self.calls_updated + self.calls_skipped_duplicate
  }

  /// A copy of this report with `row_errors` truncated to the first `limit`.
  pub fn truncated(&self, limit: usize) -> TruncatedResult {
    TruncatedResult {
      result:           IngestionResult {
        row_errors: self.row_errors.iter().take(limit).cloned().collect(),
        ..self.clone()
      },
      total_row_errors: self.row_errors.len(),
    }
  }
}

/// An [`IngestionResult`] trimmed for display, remembering how many row errors
/// there were in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncatedResult {
  #[serde(flatten)]
  pub result:           IngestionResult,
  pub total_row_errors: usize,
}
