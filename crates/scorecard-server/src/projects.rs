//! Handlers for `/projects/{project_id}/…` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/projects/{project_id}/uploads` | `.xlsx` bytes, or a JSON workbook with `Content-Type: application/json` |
//! | `GET`  | `/projects/{project_id}/criteria` | Current taxonomy snapshot |

use axum::{
  Json,
  extract::{FromRequestParts, Path, State},
  http::{HeaderMap, header, request::Parts},
};
use bytes::Bytes;
use scorecard_core::{report::TruncatedResult, store::ScoreStore, taxonomy::Taxonomy};
use scorecard_sheet::{MemoryWorkbook, Workbook as _, XlsxWorkbook, locate_sheets};
use uuid::Uuid;

use crate::{AppState, error::Error};

// ─── Path ────────────────────────────────────────────────────────────────────

/// The `{project_id}` path segment. A malformed id is rejected with the same
/// JSON error body as every other failure.
pub struct ProjectId(pub Uuid);

impl<St> FromRequestParts<St> for ProjectId
where
  St: Send + Sync,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &St,
  ) -> Result<Self, Self::Rejection> {
    let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
      .await
      .map_err(|e| Error::BadRequest(format!("invalid project id: {}", e.body_text())))?;
    Ok(Self(id))
  }
}

// ─── Upload ──────────────────────────────────────────────────────────────────

fn is_json(headers: &HeaderMap) -> bool {
  headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|ct| ct.starts_with("application/json"))
}

/// `POST /projects/{project_id}/uploads`
///
/// Responds with the ingestion report, its row errors cut to the configured
/// limit.
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  ProjectId(project_id): ProjectId,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<TruncatedResult>, Error>
where
  S: ScoreStore + 'static,
{
  if body.is_empty() {
    return Err(Error::BadRequest("empty upload".into()));
  }

  let report = if is_json(&headers) {
    let workbook = MemoryWorkbook::from_json(&body).map_err(Error::Workbook)?;
    state.ingestor.ingest(project_id, &workbook).await?
  } else {
    let vocabulary = state.ingestor.vocabulary().clone();
    let workbook = tokio::task::spawn_blocking(move || {
      let workbook = XlsxWorkbook::from_bytes(body.to_vec())?;
      // Decode only the sheets the run reads. A missing sheet is reported by
      // the ingestor.
      let names = workbook.sheet_names();
      if let Ok(sheets) = locate_sheets(&names, vocabulary.as_ref()) {
        workbook.preload(&[sheets.taxonomy, sheets.data])?;
      }
      Ok::<_, scorecard_sheet::Error>(workbook)
    })
    .await?
    .map_err(Error::Workbook)?;
    state.ingestor.ingest(project_id, &workbook).await?
  };

  Ok(Json(report.truncated(state.config.max_reported_row_errors)))
}

// ─── Criteria ────────────────────────────────────────────────────────────────

/// `GET /projects/{project_id}/criteria`
pub async fn criteria<S>(
  State(state): State<AppState<S>>,
  ProjectId(project_id): ProjectId,
) -> Result<Json<Taxonomy>, Error>
where
  S: ScoreStore + 'static,
{
  let taxonomy = state
    .ingestor
    .store()
    .load_taxonomy(project_id)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;
  Ok(Json(taxonomy))
}
