//! Error and diagnostic types for the scorecard-sheet parser.
//!
//! [`Error`] is fatal for a workbook. [`Warning`] describes a problem scoped
//! to one row, column or criterion; parsing carries on past it.
//! [`RowParseError`] rejects a single data row.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no sheet matching {wanted:?}; available sheets: {available:?}")]
  SheetNotFound {
    wanted:    String,
    available: Vec<String>,
  },

  #[error("workbook has no sheet named {0:?}")]
  NoSuchSheet(String),

  #[error("sheet {sheet:?} needs 3 header rows, found {found}")]
  MissingHeaderRows { sheet: String, found: usize },

  #[error("workbook error: {0}")]
  Workbook(String),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A non-fatal problem found while reading the taxonomy or the data headers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
  #[error(
    "taxonomy row {row}: criterion {number} already exists in group \
     {group:?}; keeping the first definition"
  )]
  DuplicateCriterionNumber {
    row:    usize,
    group:  String,
    number: u32,
  },

  #[error("taxonomy row {row}: criterion number {value:?} is not a whole number")]
  InvalidCriterionNumber { row: usize, value: String },

  #[error("taxonomy row {row}: criterion {number} has no name")]
  MissingCriterionName { row: usize, number: u32 },

  #[error(
    "column {column} ({header:?}) refers to criterion {number}, which is not \
     in the taxonomy; column ignored"
  )]
  UnmappedColumn {
    column: usize,
    header: String,
    number: u32,
  },

  #[error(
    "criterion {number} has more than one {role} column ({first} and \
     {second}); its columns are excluded from this run"
  )]
  DuplicateColumnRole {
    number: u32,
    role:   &'static str,
    first:  usize,
    second: usize,
  },
}

/// A data row that cannot be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowParseError {
  #[error("final percent {value:?} is not a number")]
  InvalidFinalPercent { row_number: usize, value: String },
}

impl RowParseError {
  /// 1-based row number in the data sheet.
  pub fn row_number(&self) -> usize {
    match self {
      Self::InvalidFinalPercent { row_number, .. } => *row_number,
    }
  }
}
