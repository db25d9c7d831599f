//! Per-call score records.
//!
//! A [`ParsedCall`] is what one data-sheet row turns into. It becomes a
//! [`NewCall`] once its header fields (external id, manager, date, duration)
//! are derived from the metadata, and a [`StoredCall`] once persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Error, Result};

/// Raw metadata cells keyed by [`MetadataField::as_str`].
pub type Metadata = BTreeMap<String, serde_json::Value>;

// ─── Metadata fields ─────────────────────────────────────────────────────────

/// A non-score column of the data sheet the engine knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
  CallDate,
  ManagerName,
  ManagerId,
  Duration,
  CallId,
  CallWeek,
  ClientName,
  Transcription,
  CrmUrl,
  // CRM context, carried through to metadata untouched.
  LeadId,
  LeadName,
  LeadStatus,
  LeadPipeline,
  ContactId,
  Phone,
  Source,
  CallType,
  CallTime,
}

impl MetadataField {
  /// The key used in [`Metadata`] maps.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::CallDate => "call_date",
      Self::ManagerName => "manager_name",
      Self::ManagerId => "manager_id",
      Self::Duration => "duration",
      Self::CallId => "call_id",
      Self::CallWeek => "call_week",
      Self::ClientName => "client_name",
      Self::Transcription => "transcription",
      Self::CrmUrl => "crm_url",
      Self::LeadId => "lead_id",
      Self::LeadName => "lead_name",
      Self::LeadStatus => "lead_status",
      Self::LeadPipeline => "lead_pipeline",
      Self::ContactId => "contact_id",
      Self::Phone => "phone",
      Self::Source => "source",
      Self::CallType => "call_type",
      Self::CallTime => "call_time",
    }
  }
}

// ─── Score values ────────────────────────────────────────────────────────────

/// The discriminant of a [`ScoreValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
  Numeric,
  Tag,
  Text,
}

impl ValueKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Numeric => "numeric",
      Self::Tag => "tag",
      Self::Text => "text",
    }
  }

  pub fn from_discriminant(s: &str) -> Result<Self> {
    match s {
      "numeric" => Ok(Self::Numeric),
      "tag" => Ok(Self::Tag),
      "text" => Ok(Self::Text),
      other => Err(Error::UnknownValueKind(other.to_string())),
    }
  }
}

/// A normalized score cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "value_kind", content = "value", rename_all = "lowercase")]
pub enum ScoreValue {
  Numeric(f64),
  Tag(String),
  Text(String),
}

impl ScoreValue {
  pub fn kind(&self) -> ValueKind {
    match self {
      Self::Numeric(_) => ValueKind::Numeric,
      Self::Tag(_) => ValueKind::Tag,
      Self::Text(_) => ValueKind::Text,
    }
  }

  /// The canonical string form stored alongside the kind. Integer-valued
  /// numbers render without a fractional part.
  pub fn normalized(&self) -> String {
    match self {
      Self::Numeric(n) => format_number(*n),
      Self::Tag(s) | Self::Text(s) => s.clone(),
    }
  }

  /// Rebuild a value from the (kind, normalized) pair stored in the database.
  pub fn from_parts(kind: ValueKind, normalized: &str) -> Result<Self> {
    match kind {
      ValueKind::Numeric => normalized
        .parse::<f64>()
        .map(Self::Numeric)
        .map_err(|_| Error::InvalidNumericValue(normalized.to_string())),
      ValueKind::Tag => Ok(Self::Tag(normalized.to_string())),
      ValueKind::Text => Ok(Self::Text(normalized.to_string())),
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Numeric(n) => Some(*n),
      _ => None,
    }
  }
}

/// Render `n` the way a person would type it: `5`, not `5.0`.
pub fn format_number(n: f64) -> String {
  if n.fract() == 0.0 && n.abs() < 1e15 {
    format!("{}", n as i64)
  } else {
    n.to_string()
  }
}

// ─── Entries and records ─────────────────────────────────────────────────────

/// One criterion's score on one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallScoreEntry {
  pub criterion_number: u32,
  #[serde(flatten)]
  pub value:            ScoreValue,
  pub reason:           Option<String>,
  pub quote:            Option<String>,
}

impl CallScoreEntry {
  pub fn value_kind(&self) -> ValueKind { self.value.kind() }
}

/// A data-sheet row assembled into a typed record, not yet committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCall {
  /// 1-based row number in the source sheet.
  pub row_number:    usize,
  /// The source system's call identifier, taken from the call-id column.
  pub external_id:   Option<String>,
  pub metadata:      Metadata,
  /// Ordered by taxonomy order.
  pub scores:        Vec<CallScoreEntry>,
  pub final_percent: Option<f64>,
}

impl ParsedCall {
  pub fn score(&self, criterion_number: u32) -> Option<&CallScoreEntry> {
    self
      .scores
      .iter()
      .find(|s| s.criterion_number == criterion_number)
  }

  /// SHA-256 hex digest over the final percent and the score set.
  ///
  /// Entries are hashed in criterion-number order so a reordered taxonomy
  /// does not change the digest. Metadata is not part of the identity.
  pub fn content_hash(&self) -> String {
    let mut entries: Vec<&CallScoreEntry> = self.scores.iter().collect();
    entries.sort_by_key(|e| e.criterion_number);

    let mut hasher = Sha256::new();
    match self.final_percent {
      Some(p) => {
        hasher.update([1u8]);
        hasher.update(p.to_bits().to_le_bytes());
      }
      None => hasher.update([0u8]),
    }
    for entry in entries {
      hasher.update(entry.criterion_number.to_le_bytes());
      hash_field(&mut hasher, Some(entry.value_kind().as_str()));
      hash_field(&mut hasher, Some(&entry.value.normalized()));
      hash_field(&mut hasher, entry.reason.as_deref());
      hash_field(&mut hasher, entry.quote.as_deref());
    }
    hex::encode(hasher.finalize())
  }
}

/// Length-prefixed so that adjacent fields cannot run into each other.
fn hash_field(hasher: &mut Sha256, value: Option<&str>) {
  match value {
    Some(s) => {
      hasher.update([1u8]);
      hasher.update((s.len() as u64).to_le_bytes());
      hasher.update(s.as_bytes());
    }
    None => hasher.update([0u8]),
  }
}

// ─── NewCall ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ScoreStore::upsert_call`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewCall {
  pub project_id:       Uuid,
  pub external_id:      String,
  pub manager_name:     Option<String>,
  pub call_date:        Option<NaiveDateTime>,
  pub call_week:        Option<String>,
  pub duration_seconds: Option<i64>,
  pub final_percent:    Option<f64>,
  pub metadata:         Metadata,
  pub scores:           Vec<CallScoreEntry>,
  /// [`ParsedCall::content_hash`] of the source record.
  pub content_hash:     String,
}

impl NewCall {
  /// Derive the call header from `parsed.metadata`. Returns `None` when the
  /// row carries no external id.
  pub fn from_parsed(project_id: Uuid, parsed: ParsedCall) -> Option<Self> {
    let external_id = parsed.external_id.clone()?;
    let content_hash = parsed.content_hash();
    let field = |f: MetadataField| parsed.metadata.get(f.as_str());

    Some(Self {
      project_id,
      external_id,
      manager_name: field(MetadataField::ManagerName).and_then(value_to_text),
      call_date: field(MetadataField::CallDate).and_then(parse_call_date),
      call_week: field(MetadataField::CallWeek).and_then(value_to_text),
      duration_seconds: field(MetadataField::Duration)
        .and_then(parse_duration_seconds),
      final_percent: parsed.final_percent,
      metadata: parsed.metadata,
      scores: parsed.scores,
      content_hash,
    })
  }
}

// ─── StoredCall ──────────────────────────────────────────────────────────────

/// A call as persisted, with its full current score set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCall {
  pub call_id:          Uuid,
  pub project_id:       Uuid,
  pub external_id:      String,
  pub manager_name:     Option<String>,
  pub call_date:        Option<NaiveDateTime>,
  pub call_week:        Option<String>,
  pub duration_seconds: Option<i64>,
  pub final_percent:    Option<f64>,
  pub metadata:         Metadata,
  pub scores:           Vec<CallScoreEntry>,
  pub content_hash:     String,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

// ─── Header derivation ───────────────────────────────────────────────────────

/// A metadata value as trimmed, non-empty text.
pub fn value_to_text(value: &serde_json::Value) -> Option<String> {
  match value {
    serde_json::Value::String(s) => {
      let s = s.trim();
      (!s.is_empty()).then(|| s.to_string())
    }
    serde_json::Value::Number(n) => n
      .as_i64()
      .map(|i| i.to_string())
      .or_else(|| n.as_f64().map(format_number)),
    serde_json::Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

const DATE_TIME_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%d %H:%M",
  "%d.%m.%Y %H:%M:%S",
  "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Parse the call-date cell. Accepts ISO timestamps and dates as well as the
/// `dd.mm.yyyy` form common in Russian-locale exports.
pub fn parse_call_date(value: &serde_json::Value) -> Option<NaiveDateTime> {
  let text = value.as_str()?.trim();
  for fmt in DATE_TIME_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
      return Some(dt);
    }
  }
  for fmt in DATE_FORMATS {
    if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
      return d.and_hms_opt(0, 0, 0);
    }
  }
  None
}

/// Parse the duration cell into seconds.
///
/// Plain numbers below 1000 are minutes; larger ones are already seconds.
/// `mm:ss` and `hh:mm:ss` strings are also accepted.
pub fn parse_duration_seconds(value: &serde_json::Value) -> Option<i64> {
  let minutes_or_seconds = |n: f64| {
    if n < 0.0 || !n.is_finite() {
      None
    } else if n < 1000.0 {
      Some((n * 60.0).round() as i64)
    } else {
      Some(n.round() as i64)
    }
  };

  match value {
    serde_json::Value::Number(n) => n.as_f64().and_then(minutes_or_seconds),
    serde_json::Value::String(s) => {
      let s = s.trim();
      if s.contains(':') {
        let parts: Vec<i64> = s
          .split(':')
          .map(|p| p.trim().parse::<i64>())
          .collect::<Result<_, _>>()
          .ok()?;
        match parts.as_slice() {
          [m, sec] => Some(m * 60 + sec),
          [h, m, sec] => Some(h * 3600 + m * 60 + sec),
          _ => None,
        }
      } else {
        s.replace(',', ".")
          .parse::<f64>()
          .ok()
          .and_then(minutes_or_seconds)
      }
    }
    _ => None,
  }
}
