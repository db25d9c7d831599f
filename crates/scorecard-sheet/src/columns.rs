//! Data-sheet column classification.
//!
//! The data sheet opens with three header rows: machine keys, a decorative
//! group-label row, and the human-readable headers. Every column is labelled
//! once with a [`ColumnRole`] before any data row is read.

use std::{
  collections::{BTreeMap, BTreeSet},
  sync::LazyLock,
};

use regex::Regex;
use scorecard_core::{call::MetadataField, taxonomy::Taxonomy};

use crate::{
  cell::{Cell, EMPTY},
  error::{Error, Result, Warning},
  vocabulary::{Vocabulary, fold},
  workbook::Rows,
};

/// Number of header rows above the first data row.
pub const HEADER_ROWS: usize = 3;

static CRITERION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\d+)[.)]?\s+(.*)$").expect("criterion header pattern is valid")
});

/// `score_0`, `reason_0`, `quote_0`: zero-based, so `_0` is criterion 1.
static CRITERION_KEY: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(score|reason|quote)_(\d+)$").expect("criterion key pattern is valid")
});

// ─── Roles ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRole {
  Metadata(MetadataField),
  Score(u32),
  Reason(u32),
  Quote(u32),
  /// An aggregate column; carries the header as written.
  Formula(String),
  Unknown,
}

impl ColumnRole {
  /// The criterion a score, reason or quote column belongs to.
  pub fn criterion_number(&self) -> Option<u32> {
    match self {
      Self::Score(n) | Self::Reason(n) | Self::Quote(n) => Some(*n),
      _ => None,
    }
  }
}

/// The columns carrying one criterion's score, reason and quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnTriple {
  pub score_col:  Option<usize>,
  pub reason_col: Option<usize>,
  pub quote_col:  Option<usize>,
}

impl ColumnTriple {
  pub fn columns(&self) -> impl Iterator<Item = usize> {
    [self.score_col, self.reason_col, self.quote_col]
      .into_iter()
      .flatten()
  }

  fn slot(&mut self, role: &ColumnRole) -> Option<(&mut Option<usize>, &'static str)> {
    match role {
      ColumnRole::Score(_) => Some((&mut self.score_col, "score")),
      ColumnRole::Reason(_) => Some((&mut self.reason_col, "reason")),
      ColumnRole::Quote(_) => Some((&mut self.quote_col, "quote")),
      _ => None,
    }
  }
}

// ─── Header rows ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderRows {
  pub system_keys:  Vec<Cell>,
  /// Decorative; kept for diagnostics only.
  pub group_labels: Vec<Cell>,
  pub headers:      Vec<Cell>,
}

impl HeaderRows {
  pub fn new(system_keys: Vec<Cell>, group_labels: Vec<Cell>, headers: Vec<Cell>) -> Self {
    Self {
      system_keys,
      group_labels,
      headers,
    }
  }

  pub fn width(&self) -> usize {
    self
      .system_keys
      .len()
      .max(self.group_labels.len())
      .max(self.headers.len())
  }
}

/// Pull the three header rows off the front of `rows`.
pub fn read_header_rows(sheet: &str, rows: &mut Rows<'_>) -> Result<HeaderRows> {
  let taken: Vec<Vec<Cell>> = rows.by_ref().take(HEADER_ROWS).collect();
  let found = taken.len();
  match <[Vec<Cell>; HEADER_ROWS]>::try_from(taken) {
    Ok([system_keys, group_labels, headers]) => {
      Ok(HeaderRows::new(system_keys, group_labels, headers))
    }
    Err(_) => Err(Error::MissingHeaderRows {
      sheet: sheet.to_string(),
      found,
    }),
  }
}

// ─── Column map ──────────────────────────────────────────────────────────────

/// The result of classifying a data sheet's header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
  /// One role per column, by column index.
  pub roles:             Vec<ColumnRole>,
  /// Per-criterion columns, keyed by criterion number. Criteria whose
  /// columns conflict are absent.
  pub triples:           BTreeMap<u32, ColumnTriple>,
  /// The column the final percentage is read from: the column keyed as the
  /// final percentage if there is one, else the first formula column, left
  /// to right, whose label marks it as final.
  pub final_percent_col: Option<usize>,
  /// Trimmed human header text per column, for spotting repeated headers.
  pub header_text:       Vec<Option<String>>,
  pub warnings:          Vec<Warning>,
}

impl ColumnMap {
  pub fn role(&self, column: usize) -> &ColumnRole {
    self.roles.get(column).unwrap_or(&ColumnRole::Unknown)
  }

  pub fn triple(&self, number: u32) -> Option<&ColumnTriple> {
    self.triples.get(&number)
  }

  pub fn metadata_columns(&self) -> impl Iterator<Item = (usize, MetadataField)> + '_ {
    self.roles.iter().enumerate().filter_map(|(i, role)| match role {
      ColumnRole::Metadata(field) => Some((i, *field)),
      _ => None,
    })
  }

  pub fn has_metadata(&self, field: MetadataField) -> bool {
    self.metadata_columns().any(|(_, f)| f == field)
  }
}

/// Label every column of the data sheet.
///
/// Pure: the same headers and taxonomy always give the same map.
pub fn classify_columns(
  headers: &HeaderRows,
  taxonomy: &Taxonomy,
  vocabulary: &dyn Vocabulary,
) -> ColumnMap {
  let mut map = ColumnMap::default();
  let mut conflicted = BTreeSet::new();
  let mut final_key_col = None;

  for column in 0..headers.width() {
    let header = headers.headers.get(column).unwrap_or(&EMPTY);
    let system_key = headers.system_keys.get(column).unwrap_or(&EMPTY);
    let role = classify_one(column, header, system_key, taxonomy, vocabulary, &mut map.warnings);
    map.header_text.push(header.text());

    if let Some(number) = role.criterion_number() {
      let triple = map.triples.entry(number).or_default();
      if let Some((slot, name)) = triple.slot(&role) {
        match *slot {
          Some(first) => {
            map.warnings.push(Warning::DuplicateColumnRole {
              number,
              role: name,
              first,
              second: column,
            });
            conflicted.insert(number);
          }
          None => *slot = Some(column),
        }
      }
    }

    if let ColumnRole::Formula(label) = &role {
      let keyed = system_key
        .text()
        .is_some_and(|key| vocabulary.is_final_percent_key(&fold(&key)));
      if keyed {
        final_key_col = final_key_col.or(Some(column));
      } else if map.final_percent_col.is_none() && vocabulary.is_final_percent(&fold(label)) {
        map.final_percent_col = Some(column);
      }
    }

    map.roles.push(role);
  }
  map.final_percent_col = final_key_col.or(map.final_percent_col);

  for number in conflicted {
    map.triples.remove(&number);
    for role in map.roles.iter_mut() {
      if role.criterion_number() == Some(number) {
        *role = ColumnRole::Unknown;
      }
    }
  }

  map
}

fn classify_one(
  column: usize,
  header: &Cell,
  system_key: &Cell,
  taxonomy: &Taxonomy,
  vocabulary: &dyn Vocabulary,
  warnings: &mut Vec<Warning>,
) -> ColumnRole {
  let label = header.text().unwrap_or_default();
  let folded = fold(&label);

  let metadata = vocabulary.metadata_field(&folded).or_else(|| {
    system_key
      .text()
      .and_then(|key| vocabulary.metadata_field(&fold(&key)))
  });
  if let Some(field) = metadata {
    return ColumnRole::Metadata(field);
  }

  if let Some(caps) = CRITERION_HEADER.captures(&folded) {
    let Some(number) = caps[1].parse::<u32>().ok().filter(|n| taxonomy.contains_number(*n))
    else {
      warnings.push(Warning::UnmappedColumn {
        column,
        header: label,
        number: caps[1].parse().unwrap_or(u32::MAX),
      });
      return ColumnRole::Unknown;
    };
    let rest = &caps[2];
    return if vocabulary.is_reason(rest) {
      ColumnRole::Reason(number)
    } else if vocabulary.is_quote(rest) {
      ColumnRole::Quote(number)
    } else {
      ColumnRole::Score(number)
    };
  }

  let key = system_key.text().map(|k| fold(&k)).unwrap_or_default();
  if let Some(role) = criterion_from_key(column, &key, taxonomy, warnings) {
    return role;
  }

  if vocabulary.is_formula(&folded) {
    return ColumnRole::Formula(label);
  }
  if vocabulary.is_final_percent_key(&key) {
    return ColumnRole::Formula(if label.is_empty() { key } else { label });
  }

  ColumnRole::Unknown
}

/// Fallback for columns whose human header carries no criterion number.
fn criterion_from_key(
  column: usize,
  key: &str,
  taxonomy: &Taxonomy,
  warnings: &mut Vec<Warning>,
) -> Option<ColumnRole> {
  let caps = CRITERION_KEY.captures(key)?;
  let number = caps[2].parse::<u32>().ok()?.checked_add(1)?;
  if !taxonomy.contains_number(number) {
    warnings.push(Warning::UnmappedColumn {
      column,
      header: key.to_string(),
      number,
    });
    return Some(ColumnRole::Unknown);
  }
  Some(match &caps[1] {
    "reason" => ColumnRole::Reason(number),
    "quote" => ColumnRole::Quote(number),
    _ => ColumnRole::Score(number),
  })
}
