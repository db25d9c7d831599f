//! Header and label vocabulary.
//!
//! The parser asks a [`Vocabulary`] every locale-dependent question (is this a
//! reason column? which metadata field is "дата звонка"?). The keyword tables
//! are fixed configuration; swapping the vocabulary never touches the parsing
//! algorithm.
//!
//! All methods receive text already passed through [`fold`].

use scorecard_core::{call::MetadataField, taxonomy::ScoreType};

/// Lower-case, trim and collapse internal whitespace.
pub fn fold(s: &str) -> String {
  s.split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

pub trait Vocabulary: Send + Sync {
  /// Keywords that identify the taxonomy sheet, tried in order.
  fn taxonomy_sheet_keywords(&self) -> &[&str];

  /// Keywords that identify the data sheet, tried in order.
  fn data_sheet_keywords(&self) -> &[&str];

  /// Name of the synthetic group for criteria listed before any group row.
  fn ungrouped_name(&self) -> &str;

  /// Exact lookup of a header (or system key) in the metadata table.
  fn metadata_field(&self, folded: &str) -> Option<MetadataField>;

  fn is_reason(&self, folded: &str) -> bool;

  fn is_quote(&self, folded: &str) -> bool;

  /// Aggregate formula columns ("FINAL Average Call Percent").
  fn is_formula(&self, folded: &str) -> bool;

  /// Formula columns holding the call's final percentage.
  fn is_final_percent(&self, folded: &str) -> bool;

  /// A system key that pins the final percentage column, whatever its
  /// human header says.
  fn is_final_percent_key(&self, folded_key: &str) -> bool;

  /// `Some(true)` / `Some(false)` for recognised yes / no words.
  fn yes_no(&self, folded: &str) -> Option<bool>;

  /// Infer how a criterion is scored from its name.
  fn score_type(&self, folded_name: &str) -> ScoreType;
}

// ─── Default tables ──────────────────────────────────────────────────────────

const METADATA_KEYWORDS: &[(&str, MetadataField)] = &[
  ("дата звонка", MetadataField::CallDate),
  ("дата", MetadataField::CallDate),
  ("call date", MetadataField::CallDate),
  ("call_date", MetadataField::CallDate),
  ("date", MetadataField::CallDate),
  ("менеджер", MetadataField::ManagerName),
  ("фио менеджера", MetadataField::ManagerName),
  ("manager", MetadataField::ManagerName),
  ("manager name", MetadataField::ManagerName),
  ("manager_name", MetadataField::ManagerName),
  ("user_name", MetadataField::ManagerName),
  ("id менеджера", MetadataField::ManagerId),
  ("manager_id", MetadataField::ManagerId),
  ("user_id", MetadataField::ManagerId),
  ("длительность", MetadataField::Duration),
  ("длительность звонка", MetadataField::Duration),
  ("duration", MetadataField::Duration),
  ("call_duration", MetadataField::Duration),
  ("real_file_duration", MetadataField::Duration),
  ("id звонка", MetadataField::CallId),
  ("call id", MetadataField::CallId),
  ("call_id", MetadataField::CallId),
  ("id_item_set", MetadataField::CallId),
  ("неделя", MetadataField::CallWeek),
  ("неделя звонка", MetadataField::CallWeek),
  ("week", MetadataField::CallWeek),
  ("call week", MetadataField::CallWeek),
  ("call_week", MetadataField::CallWeek),
  ("default_call_week", MetadataField::CallWeek),
  ("клиент", MetadataField::ClientName),
  ("client", MetadataField::ClientName),
  ("contact_name", MetadataField::ClientName),
  ("транскрипция", MetadataField::Transcription),
  ("transcription", MetadataField::Transcription),
  ("ссылка на сделку", MetadataField::CrmUrl),
  ("crm url", MetadataField::CrmUrl),
  ("lead_url", MetadataField::CrmUrl),
  ("id сделки", MetadataField::LeadId),
  ("lead_id", MetadataField::LeadId),
  ("название сделки", MetadataField::LeadName),
  ("lead_name", MetadataField::LeadName),
  ("статус сделки", MetadataField::LeadStatus),
  ("lead_status", MetadataField::LeadStatus),
  ("воронка", MetadataField::LeadPipeline),
  ("lead_pipeline", MetadataField::LeadPipeline),
  ("id контакта", MetadataField::ContactId),
  ("contact_id", MetadataField::ContactId),
  ("телефон", MetadataField::Phone),
  ("phone", MetadataField::Phone),
  ("call_phone", MetadataField::Phone),
  ("источник", MetadataField::Source),
  ("source", MetadataField::Source),
  ("call_source", MetadataField::Source),
  ("тип звонка", MetadataField::CallType),
  ("call type", MetadataField::CallType),
  ("call_type", MetadataField::CallType),
  ("время звонка", MetadataField::CallTime),
  ("call time", MetadataField::CallTime),
  ("call_time", MetadataField::CallTime),
];

/// System key of the column holding the final percentage.
const FINAL_PERCENT_KEY: &str = "key_13";

const REASON_KEYWORDS: &[&str] = &["reason", "причина", "обоснование"];
const QUOTE_KEYWORDS: &[&str] = &["quote", "цитата", "выдержка"];
const FORMULA_KEYWORDS: &[&str] = &["final", "average", "итог", "среднее"];
const FINAL_KEYWORDS: &[&str] = &["final", "итог"];

const YES_WORDS: &[&str] =
  &["да", "yes", "true", "1", "+", "включено", "включить"];
const NO_WORDS: &[&str] =
  &["нет", "no", "false", "0", "-", "исключено", "исключить"];

const RECOMMENDATION_MARKERS: &[&str] = &["рекоменд", "recommend"];
const TAG_MARKERS: &[&str] = &["тег", "tag", "["];

/// Russian + English tables matching the exports the engine was built for.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVocabulary;

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
  needles.iter().any(|n| haystack.contains(n))
}

impl Vocabulary for DefaultVocabulary {
  fn taxonomy_sheet_keywords(&self) -> &[&str] { &["criteria", "критери"] }

  fn data_sheet_keywords(&self) -> &[&str] { &["ai", "data", "звонки", "calls"] }

  fn ungrouped_name(&self) -> &str { "Ungrouped" }

  fn metadata_field(&self, folded: &str) -> Option<MetadataField> {
    METADATA_KEYWORDS
      .iter()
      .find(|(keyword, _)| *keyword == folded)
      .map(|(_, field)| *field)
  }

  fn is_reason(&self, folded: &str) -> bool {
    contains_any(folded, REASON_KEYWORDS)
  }

  fn is_quote(&self, folded: &str) -> bool {
    contains_any(folded, QUOTE_KEYWORDS)
  }

  fn is_formula(&self, folded: &str) -> bool {
    contains_any(folded, FORMULA_KEYWORDS)
  }

  fn is_final_percent(&self, folded: &str) -> bool {
    contains_any(folded, FINAL_KEYWORDS)
  }

  fn is_final_percent_key(&self, folded_key: &str) -> bool {
    folded_key == FINAL_PERCENT_KEY
  }

  fn yes_no(&self, folded: &str) -> Option<bool> {
    if YES_WORDS.contains(&folded) {
      Some(true)
    } else if NO_WORDS.contains(&folded) {
      Some(false)
    } else {
      None
    }
  }

  fn score_type(&self, folded_name: &str) -> ScoreType {
    if contains_any(folded_name, RECOMMENDATION_MARKERS) {
      ScoreType::Recommendation
    } else if contains_any(folded_name, TAG_MARKERS) {
      ScoreType::Tag
    } else {
      ScoreType::Numeric
    }
  }
}
