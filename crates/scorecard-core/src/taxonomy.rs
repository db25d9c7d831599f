//! The criteria taxonomy: named groups of numbered scoring criteria.
//!
//! Groups are unique per project by name; criteria are unique per group by
//! number. Numbers need not be contiguous, and nothing stops two groups from
//! reusing a number. Lookups by number resolve to the first criterion in
//! taxonomy order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Score type ──────────────────────────────────────────────────────────────

/// How the scores of a criterion are expressed in the data sheet.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ScoreType {
  /// Points on a scale, e.g. 0–5.
  #[default]
  Numeric,
  /// A short label such as "Да" / "Нет".
  Tag,
  /// Free-text advice for the manager.
  Recommendation,
}

impl ScoreType {
  /// The discriminant string stored in the database.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Numeric => "numeric",
      Self::Tag => "tag",
      Self::Recommendation => "recommendation",
    }
  }

  pub fn from_discriminant(s: &str) -> Result<Self> {
    match s {
      "numeric" => Ok(Self::Numeric),
      "tag" => Ok(Self::Tag),
      "recommendation" => Ok(Self::Recommendation),
      other => Err(Error::UnknownScoreType(other.to_string())),
    }
  }
}

// ─── Persisted entities ──────────────────────────────────────────────────────

/// A named collection of criteria, ordered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaGroup {
  pub group_id:   Uuid,
  pub project_id: Uuid,
  pub name:       String,
  pub order:      u32,
}

/// A single numbered, named scoring dimension within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
  pub criterion_id:   Uuid,
  pub group_id:       Uuid,
  pub number:         u32,
  pub name:           String,
  /// The evaluation prompt given to the scoring model, if the sheet has one.
  pub prompt:         Option<String>,
  /// Whether this criterion contributes to the call's final percentage.
  pub in_final_score: bool,
  pub score_type:     ScoreType,
  /// Position of the criterion within the taxonomy sheet.
  pub order:          u32,
}

// ─── Store inputs ────────────────────────────────────────────────────────────

/// Input to [`crate::store::ScoreStore::upsert_criteria_group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCriteriaGroup {
  pub name:  String,
  pub order: u32,
}

/// Input to [`crate::store::ScoreStore::upsert_criterion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCriterion {
  pub number:         u32,
  pub name:           String,
  pub prompt:         Option<String>,
  pub in_final_score: bool,
  pub score_type:     ScoreType,
  pub order:          u32,
}

impl NewCriterion {
  /// Convenience constructor: no prompt, counted in the final score, numeric.
  pub fn new(number: u32, name: impl Into<String>, order: u32) -> Self {
    Self {
      number,
      name: name.into(),
      prompt: None,
      in_final_score: true,
      score_type: ScoreType::default(),
      order,
    }
  }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The groups and criteria of one project as they exist in the store at the
/// moment a data sheet is classified.
///
/// `groups` are sorted by `order`; `criteria` by their group's order, then by
/// their own `order`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
  pub groups:   Vec<CriteriaGroup>,
  pub criteria: Vec<Criterion>,
}

impl Taxonomy {
  pub fn is_empty(&self) -> bool { self.criteria.is_empty() }

  pub fn contains_number(&self, number: u32) -> bool {
    self.criteria.iter().any(|c| c.number == number)
  }

  /// The first criterion in taxonomy order carrying `number`.
  pub fn criterion(&self, number: u32) -> Option<&Criterion> {
    self.criteria.iter().find(|c| c.number == number)
  }

  pub fn group(&self, group_id: Uuid) -> Option<&CriteriaGroup> {
    self.groups.iter().find(|g| g.group_id == group_id)
  }

  /// Criteria in taxonomy order, skipping later criteria that reuse a number
  /// already yielded.
  pub fn scoring_order(&self) -> impl Iterator<Item = &Criterion> {
    let mut seen = HashSet::new();
    self.criteria.iter().filter(move |c| seen.insert(c.number))
  }
}
