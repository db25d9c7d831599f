//! Data-row assembly.
//!
//! Once the header is classified, each row is turned into a [`ParsedCall`]
//! independently of every other row, so a bad row never poisons its
//! neighbours.

use scorecard_core::{
  call::{CallScoreEntry, Metadata, MetadataField, ParsedCall, ScoreValue},
  taxonomy::{ScoreType, Taxonomy},
};

use crate::{
  cell::{Cell, EMPTY, parse_number},
  columns::{ColumnMap, HEADER_ROWS},
  error::RowParseError,
};

/// Non-numeric score cells longer than this are free text, not tags.
const TAG_MAX_CHARS: usize = 40;

const QUOTE_CHARS: &[char] = &['"', '\'', '“', '”', '„', '«', '»', '‘', '’'];

/// 1-based sheet row of the first data row.
pub const FIRST_DATA_ROW: usize = HEADER_ROWS + 1;

/// Turns data rows into [`ParsedCall`]s using a classified header.
pub struct RecordBuilder<'a> {
  columns:  &'a ColumnMap,
  taxonomy: &'a Taxonomy,
}

impl<'a> RecordBuilder<'a> {
  pub fn new(columns: &'a ColumnMap, taxonomy: &'a Taxonomy) -> Self {
    Self { columns, taxonomy }
  }

  /// Build the record for one data row. Blank rows yield `Ok(None)`.
  pub fn build(
    &self,
    row_number: usize,
    row: &[Cell],
  ) -> Result<Option<ParsedCall>, RowParseError> {
    let cell = |i: usize| row.get(i).unwrap_or(&EMPTY);

    if self.is_blank(row) || self.is_header_repeat(row) {
      return Ok(None);
    }

    let mut metadata = Metadata::new();
    for (column, field) in self.columns.metadata_columns() {
      if let Some(value) = cell_to_json(cell(column)) {
        metadata.entry(field.as_str().to_string()).or_insert(value);
      }
    }

    let external_id = metadata
      .get(MetadataField::CallId.as_str())
      .and_then(scorecard_core::call::value_to_text);

    let mut scores = Vec::new();
    for criterion in self.taxonomy.scoring_order() {
      let Some(triple) = self.columns.triple(criterion.number) else {
        continue;
      };
      let Some(score_cell) = triple.score_col.map(cell).filter(|c| !c.is_empty())
      else {
        continue;
      };
      scores.push(CallScoreEntry {
        criterion_number: criterion.number,
        value:            normalize_score(score_cell, criterion.score_type),
        reason:           triple.reason_col.and_then(|c| cell(c).text()),
        quote:            triple.quote_col.and_then(|c| strip_quotes(cell(c))),
      });
    }

    let final_percent = match self.columns.final_percent_col {
      Some(column) => final_percent(row_number, cell(column))?,
      None => None,
    };

    Ok(Some(ParsedCall {
      row_number,
      external_id,
      metadata,
      scores,
      final_percent,
    }))
  }

  /// Build records for a stream of data rows, the first of which sits at
  /// sheet row `first_row_number`. Blank rows are dropped.
  pub fn records<'r, I>(
    &'r self,
    rows: I,
    first_row_number: usize,
  ) -> impl Iterator<Item = Result<ParsedCall, RowParseError>> + 'r
  where
    I: IntoIterator<Item = Vec<Cell>>,
    I::IntoIter: 'r,
  {
    rows
      .into_iter()
      .enumerate()
      .filter_map(move |(offset, row)| {
        self.build(first_row_number + offset, &row).transpose()
      })
  }

  /// No metadata and no score. Stray reason or quote text does not count.
  fn is_blank(&self, row: &[Cell]) -> bool {
    let empty = |i: usize| row.get(i).is_none_or(Cell::is_empty);
    self.columns.metadata_columns().all(|(i, _)| empty(i))
      && self
        .columns
        .triples
        .values()
        .filter_map(|t| t.score_col)
        .all(empty)
  }

  /// A data row that repeats the human header row, as some exports do
  /// directly under the header.
  fn is_header_repeat(&self, row: &[Cell]) -> bool {
    let header = &self.columns.header_text;
    header.iter().any(Option::is_some)
      && (0..header.len().max(row.len())).all(|i| {
        row.get(i).and_then(Cell::text) == header.get(i).cloned().flatten()
      })
  }
}

// ─── Cell normalization ──────────────────────────────────────────────────────

fn normalize_score(cell: &Cell, score_type: ScoreType) -> ScoreValue {
  if let Some(n) = cell.as_f64().or_else(|| percent_value(cell)) {
    return ScoreValue::Numeric(n);
  }
  let text = cell.text().unwrap_or_default();
  let free_text = score_type == ScoreType::Recommendation
    || text.chars().count() > TAG_MAX_CHARS
    || text.contains('\n');
  if free_text {
    ScoreValue::Text(text)
  } else {
    ScoreValue::Tag(text)
  }
}

/// `"80%"` → 80.
fn percent_value(cell: &Cell) -> Option<f64> {
  match cell {
    Cell::Text(s) => s.trim().strip_suffix('%').and_then(parse_number),
    _ => None,
  }
}

/// Decimal places kept on a final percentage.
const PERCENT_PRECISION: i32 = 4;

fn round_percent(p: f64) -> f64 {
  let scale = 10f64.powi(PERCENT_PRECISION);
  (p * scale).round() / scale
}

/// Final percentages arrive either as 0–100 or as a 0–1 fraction.
fn final_percent(row_number: usize, cell: &Cell) -> Result<Option<f64>, RowParseError> {
  if cell.is_empty() {
    return Ok(None);
  }
  if let Some(p) = percent_value(cell) {
    return Ok(Some(round_percent(p)));
  }
  match cell.as_f64() {
    Some(n) if (0.0..=1.0).contains(&n) => Ok(Some(round_percent(n * 100.0))),
    Some(n) => Ok(Some(round_percent(n))),
    None => Err(RowParseError::InvalidFinalPercent {
      row_number,
      value: cell.text().unwrap_or_default(),
    }),
  }
}

fn strip_quotes(cell: &Cell) -> Option<String> {
  let text = cell.text()?;
  let stripped = text.trim_matches(QUOTE_CHARS).trim();
  (!stripped.is_empty()).then(|| stripped.to_string())
}

fn cell_to_json(cell: &Cell) -> Option<serde_json::Value> {
  match cell {
    Cell::Empty => None,
    Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
      Some(serde_json::Value::from(*n as i64))
    }
    Cell::Number(n) => serde_json::Number::from_f64(*n).map(serde_json::Value::Number),
    Cell::Text(_) => cell.text().map(serde_json::Value::String),
  }
}
