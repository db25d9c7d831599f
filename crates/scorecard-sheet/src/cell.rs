//! The cell model handed over by the file layer: text, number or empty.

use scorecard_core::call::format_number;
use serde::{Deserialize, Serialize};

/// A single spreadsheet cell.
///
/// Deserialises from JSON `null`, numbers and strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
  #[default]
  Empty,
  Number(f64),
  Text(String),
}

pub(crate) static EMPTY: Cell = Cell::Empty;

impl Cell {
  /// `true` for empty cells and whitespace-only text.
  pub fn is_empty(&self) -> bool {
    match self {
      Self::Empty => true,
      Self::Number(_) => false,
      Self::Text(s) => s.trim().is_empty(),
    }
  }

  /// Trimmed, non-empty text. Numbers are rendered without a trailing `.0`.
  pub fn text(&self) -> Option<String> {
    match self {
      Self::Empty => None,
      Self::Number(n) => Some(format_number(*n)),
      Self::Text(s) => {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
      }
    }
  }

  /// The numeric value of the cell. Text is coerced when it parses as a
  /// number, with `,` accepted as the decimal separator.
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Number(n) if n.is_finite() => Some(*n),
      Self::Text(s) => parse_number(s),
      _ => None,
    }
  }

  /// The value as a whole number, if it is one.
  pub fn as_integer(&self) -> Option<i64> {
    self
      .as_f64()
      .filter(|n| n.fract() == 0.0 && n.abs() < 1e15)
      .map(|n| n as i64)
  }
}

impl From<&str> for Cell {
  fn from(s: &str) -> Self { Self::Text(s.to_string()) }
}

impl From<String> for Cell {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<f64> for Cell {
  fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<i32> for Cell {
  fn from(n: i32) -> Self { Self::Number(f64::from(n)) }
}

impl From<i64> for Cell {
  fn from(n: i64) -> Self { Self::Number(n as f64) }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Empty, Into::into) }
}

pub(crate) fn parse_number(s: &str) -> Option<f64> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  s.replace(',', ".")
    .parse::<f64>()
    .ok()
    .filter(|n| n.is_finite())
}

/// Build a row of cells from heterogeneous literals.
///
/// ```
/// use scorecard_sheet::{row, cell::Cell};
/// let r = row![None::<&str>, 2, "Имя"];
/// assert_eq!(r[0], Cell::Empty);
/// assert_eq!(r[1], Cell::Number(2.0));
/// ```
#[macro_export]
macro_rules! row {
  ($($cell:expr),* $(,)?) => {
    vec![$($crate::cell::Cell::from($cell)),*]
  };
}
