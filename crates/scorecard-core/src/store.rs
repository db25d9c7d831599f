//! The `ScoreStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `scorecard-store-sqlite`). The ingestion orchestrator and the server depend
//! on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  call::{NewCall, StoredCall},
  report::Upserted,
  taxonomy::{NewCriteriaGroup, NewCriterion, Taxonomy},
};

/// Abstraction over a scorecard store backend.
///
/// Every write is an idempotent upsert: writing the same input twice reports
/// [`UpsertOutcome::Unchanged`](crate::report::UpsertOutcome::Unchanged) the
/// second time and leaves the store as it was.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ScoreStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Taxonomy ──────────────────────────────────────────────────────────

  /// Create or update the group named `group.name` within `project_id`.
  fn upsert_criteria_group(
    &self,
    project_id: Uuid,
    group: NewCriteriaGroup,
  ) -> impl Future<Output = Result<Upserted, Self::Error>> + Send + '_;

  /// Create or update the criterion numbered `criterion.number` within
  /// `group_id`.
  fn upsert_criterion(
    &self,
    group_id: Uuid,
    criterion: NewCriterion,
  ) -> impl Future<Output = Result<Upserted, Self::Error>> + Send + '_;

  /// Read the current taxonomy snapshot of a project.
  fn load_taxonomy(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Taxonomy, Self::Error>> + Send + '_;

  // ── Calls ─────────────────────────────────────────────────────────────

  /// Insert, replace or skip a call keyed by `(project_id, external_id)`.
  ///
  /// - unseen external id → insert, [`Created`](crate::report::UpsertOutcome::Created);
  /// - same `content_hash` → no-op, `Unchanged`;
  /// - different `content_hash` → the stored score set is replaced wholesale,
  ///   `Updated`.
  ///
  /// The call row and all of its scores are committed in one transaction.
  fn upsert_call(
    &self,
    call: NewCall,
  ) -> impl Future<Output = Result<Upserted, Self::Error>> + Send + '_;

  /// Fetch a call with its scores. Returns `None` if not found.
  fn get_call<'a>(
    &'a self,
    project_id: Uuid,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<StoredCall>, Self::Error>> + Send + 'a;

  /// Number of calls stored for a project.
  fn count_calls(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
