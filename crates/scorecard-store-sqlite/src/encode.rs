//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings; call dates are naive ISO 8601. Metadata is
//! compact JSON. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDateTime, Utc};
use scorecard_core::{
  call::{CallScoreEntry, Metadata, ScoreValue, StoredCall, ValueKind},
  taxonomy::{CriteriaGroup, Criterion, ScoreType},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn encode_naive(dt: NaiveDateTime) -> String {
  dt.format(NAIVE_FORMAT).to_string()
}

pub fn decode_naive(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, NAIVE_FORMAT)
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_metadata(m: &Metadata) -> Result<String> {
  Ok(serde_json::to_string(m)?)
}

pub fn decode_metadata(s: &str) -> Result<Metadata> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `criteria_groups` row.
pub struct RawGroup {
  pub group_id:   String,
  pub project_id: String,
  pub name:       String,
  pub sort_order: i64,
}

impl RawGroup {
  pub fn into_group(self) -> Result<CriteriaGroup> {
    Ok(CriteriaGroup {
      group_id:   decode_uuid(&self.group_id)?,
      project_id: decode_uuid(&self.project_id)?,
      name:       self.name,
      order:      self.sort_order as u32,
    })
  }
}

/// Raw values read from a `criteria` row.
pub struct RawCriterion {
  pub criterion_id:   String,
  pub group_id:       String,
  pub number:         i64,
  pub name:           String,
  pub prompt:         Option<String>,
  pub in_final_score: bool,
  pub score_type:     String,
  pub sort_order:     i64,
}

impl RawCriterion {
  pub fn into_criterion(self) -> Result<Criterion> {
    Ok(Criterion {
      criterion_id:   decode_uuid(&self.criterion_id)?,
      group_id:       decode_uuid(&self.group_id)?,
      number:         self.number as u32,
      name:           self.name,
      prompt:         self.prompt,
      in_final_score: self.in_final_score,
      score_type:     ScoreType::from_discriminant(&self.score_type)?,
      order:          self.sort_order as u32,
    })
  }
}

/// Raw values read from a `call_scores` row.
pub struct RawScore {
  pub criterion_number: i64,
  pub value_kind:       String,
  pub normalized_value: String,
  pub reason:           Option<String>,
  pub quote:            Option<String>,
}

impl RawScore {
  pub fn into_entry(self) -> Result<CallScoreEntry> {
    let kind = ValueKind::from_discriminant(&self.value_kind)?;
    Ok(CallScoreEntry {
      criterion_number: self.criterion_number as u32,
      value:            ScoreValue::from_parts(kind, &self.normalized_value)?,
      reason:           self.reason,
      quote:            self.quote,
    })
  }
}

/// Raw values read from a `calls` row joined with its manager.
pub struct RawCall {
  pub call_id:          String,
  pub project_id:       String,
  pub external_id:      String,
  pub manager_name:     Option<String>,
  pub call_date:        Option<String>,
  pub call_week:        Option<String>,
  pub duration_seconds: Option<i64>,
  pub final_percent:    Option<f64>,
  pub metadata_json:    String,
  pub content_hash:     String,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawCall {
  pub fn into_call(self, scores: Vec<RawScore>) -> Result<StoredCall> {
    Ok(StoredCall {
      call_id:          decode_uuid(&self.call_id)?,
      project_id:       decode_uuid(&self.project_id)?,
      external_id:      self.external_id,
      manager_name:     self.manager_name,
      call_date:        self.call_date.as_deref().map(decode_naive).transpose()?,
      call_week:        self.call_week,
      duration_seconds: self.duration_seconds,
      final_percent:    self.final_percent,
      metadata:         decode_metadata(&self.metadata_json)?,
      scores:           scores
        .into_iter()
        .map(RawScore::into_entry)
        .collect::<Result<_>>()?,
      content_hash:     self.content_hash,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

/// A score entry flattened to column values, ready to be bound.
pub struct ScoreRow {
  pub criterion_number: i64,
  pub value_kind:       &'static str,
  pub normalized_value: String,
  pub reason:           Option<String>,
  pub quote:            Option<String>,
}

impl From<&CallScoreEntry> for ScoreRow {
  fn from(e: &CallScoreEntry) -> Self {
    Self {
      criterion_number: i64::from(e.criterion_number),
      value_kind:       e.value_kind().as_str(),
      normalized_value: e.value.normalized(),
      reason:           e.reason.clone(),
      quote:            e.quote.clone(),
    }
  }
}
