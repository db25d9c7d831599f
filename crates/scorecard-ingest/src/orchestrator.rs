//! [`Ingestor`]: runs one workbook through the parser and into the store.

use std::{collections::HashMap, sync::Arc};

use scorecard_core::{
  call::NewCall,
  report::IngestionResult,
  store::ScoreStore,
};
use scorecard_sheet::{
  DefaultVocabulary, FIRST_DATA_ROW, RecordBuilder, SheetPair, Vocabulary,
  Workbook, classify_columns, locate_sheets, parse_taxonomy, read_header_rows,
};
use uuid::Uuid;

use crate::{
  cancel::CancelFlag,
  error::{Error, Result},
  locks::ProjectLocks,
};

/// Reason recorded for data rows that carry no call identifier.
pub const MISSING_CALL_ID: &str = "missing call id";

/// Sequences sheet location, taxonomy upsert, column classification and
/// per-call upserts for a store `S`.
///
/// Cloning is cheap. Clones share the store and the per-project locks, so
/// concurrent uploads for one project are serialized across all of them.
pub struct Ingestor<S> {
  store:      Arc<S>,
  vocabulary: Arc<dyn Vocabulary>,
  locks:      ProjectLocks,
}

impl<S> Clone for Ingestor<S> {
  fn clone(&self) -> Self {
    Self {
      store:      self.store.clone(),
      vocabulary: self.vocabulary.clone(),
      locks:      self.locks.clone(),
    }
  }
}

impl<S: ScoreStore> Ingestor<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self::with_vocabulary(store, Arc::new(DefaultVocabulary))
  }

  pub fn with_vocabulary(store: Arc<S>, vocabulary: Arc<dyn Vocabulary>) -> Self {
    Self {
      store,
      vocabulary,
      locks: ProjectLocks::new(),
    }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn vocabulary(&self) -> &Arc<dyn Vocabulary> { &self.vocabulary }

  /// Ingest `workbook` into `project_id`, running to completion.
  pub async fn ingest<W: Workbook>(
    &self,
    project_id: Uuid,
    workbook: &W,
  ) -> Result<IngestionResult> {
    self
      .ingest_with_cancel(project_id, workbook, &CancelFlag::new())
      .await
  }

  /// Ingest `workbook` into `project_id`, stopping before the next data row
  /// once `cancel` is set. Rows already committed stay committed.
  pub async fn ingest_with_cancel<W: Workbook>(
    &self,
    project_id: Uuid,
    workbook: &W,
    cancel: &CancelFlag,
  ) -> Result<IngestionResult> {
    let _guard = self.locks.acquire(project_id).await;
    let vocabulary = self.vocabulary.as_ref();
    let mut result = IngestionResult::default();

    // Both sheets must exist before anything is written.
    let names = workbook.sheet_names();
    let SheetPair {
      taxonomy: taxonomy_sheet,
      data: data_sheet,
    } = locate_sheets(&names, vocabulary)?;

    // ── Taxonomy ──────────────────────────────────────────────────────────

    let parsed = parse_taxonomy(workbook.rows(taxonomy_sheet)?, vocabulary);
    if parsed.criteria.is_empty() {
      return Err(Error::EmptyTaxonomy {
        sheet: taxonomy_sheet.to_string(),
      });
    }

    let mut group_ids = HashMap::new();
    for group in &parsed.groups {
      let upserted = self
        .store
        .upsert_criteria_group(project_id, group.clone())
        .await
        .map_err(Error::store)?;
      result.record_group(upserted.outcome);
      group_ids.insert(group.name.as_str(), upserted.id);
    }

    for parsed_criterion in &parsed.criteria {
      let Some(&group_id) = group_ids.get(parsed_criterion.group_name.as_str()) else {
        continue;
      };
      let upserted = self
        .store
        .upsert_criterion(group_id, parsed_criterion.criterion.clone())
        .await
        .map_err(Error::store)?;
      result.record_criterion(upserted.outcome);
    }

    let taxonomy = self
      .store
      .load_taxonomy(project_id)
      .await
      .map_err(Error::store)?;
    if taxonomy.is_empty() {
      return Err(Error::EmptyTaxonomy {
        sheet: taxonomy_sheet.to_string(),
      });
    }

    // ── Data sheet ────────────────────────────────────────────────────────

    let mut rows = workbook.rows(data_sheet)?;
    let header = read_header_rows(data_sheet, &mut rows)?;
    let columns = classify_columns(&header, &taxonomy, vocabulary);

    for warning in parsed.warnings.iter().chain(&columns.warnings) {
      tracing::warn!(%project_id, "{warning}");
      result.warnings.push(warning.to_string());
    }

    let builder = RecordBuilder::new(&columns, &taxonomy);
    for record in builder.records(rows, FIRST_DATA_ROW) {
      if cancel.is_cancelled() {
        tracing::info!(%project_id, "ingestion cancelled");
        result.cancelled = true;
        break;
      }

      let call = match record {
        Ok(call) => call,
        Err(e) => {
          tracing::warn!(%project_id, row = e.row_number(), "{e}");
          result.row_error(e.row_number(), e.to_string());
          continue;
        }
      };

      let row_number = call.row_number;
      let Some(new_call) = NewCall::from_parsed(project_id, call) else {
        tracing::warn!(%project_id, row = row_number, "{}", MISSING_CALL_ID);
        result.row_error(row_number, MISSING_CALL_ID);
        continue;
      };

      let external_id = new_call.external_id.clone();
      match self.store.upsert_call(new_call).await {
        Ok(upserted) => {
          tracing::debug!(
            %project_id,
            row = row_number,
            %external_id,
            outcome = ?upserted.outcome,
            "call upserted"
          );
          result.record_call(upserted.outcome);
        }
        Err(e) => {
          tracing::warn!(%project_id, row = row_number, %external_id, "store conflict: {e}");
          result.row_error(row_number, format!("store conflict: {e}"));
        }
      }
    }

    tracing::info!(
      %project_id,
      groups_created = result.groups_created,
      criteria_created = result.criteria_created,
      criteria_updated = result.criteria_updated,
      calls_created = result.calls_created,
      calls_updated = result.calls_updated,
      calls_skipped = result.calls_skipped_duplicate,
      row_errors = result.row_errors.len(),
      "ingestion finished"
    );

    Ok(result)
  }
}
