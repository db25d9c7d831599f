//! Row access to a workbook, addressable by sheet name.
//!
//! The parser never sees a file format; it pulls rows through [`Workbook`].
//! [`MemoryWorkbook`] holds rows in memory (tests, JSON uploads);
//! [`crate::xlsx::XlsxWorkbook`] reads `.xlsx` files.

use serde::{Deserialize, Serialize};

use crate::{
  cell::Cell,
  error::{Error, Result},
};

/// A lazily produced sequence of rows.
pub type Rows<'a> = Box<dyn Iterator<Item = Vec<Cell>> + Send + 'a>;

pub trait Workbook: Send + Sync {
  /// Sheet names in workbook order.
  fn sheet_names(&self) -> Vec<String>;

  /// Stream the rows of the sheet named exactly `sheet`.
  fn rows(&self, sheet: &str) -> Result<Rows<'_>>;
}

// ─── In-memory workbook ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
  pub name: String,
  #[serde(default)]
  pub rows: Vec<Vec<Cell>>,
}

/// A workbook held entirely in memory.
///
/// The JSON form is `{"sheets": [{"name": "AI", "rows": [[…], …]}, …]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryWorkbook {
  pub sheets: Vec<Sheet>,
}

impl MemoryWorkbook {
  pub fn new() -> Self { Self::default() }

  /// Append a sheet; builder style.
  pub fn with_sheet(
    mut self,
    name: impl Into<String>,
    rows: Vec<Vec<Cell>>,
  ) -> Self {
    self.sheets.push(Sheet {
      name: name.into(),
      rows,
    });
    self
  }

  pub fn from_json(bytes: &[u8]) -> Result<Self> {
    Ok(serde_json::from_slice(bytes)?)
  }
}

impl Workbook for MemoryWorkbook {
  fn sheet_names(&self) -> Vec<String> {
    self.sheets.iter().map(|s| s.name.clone()).collect()
  }

  fn rows(&self, sheet: &str) -> Result<Rows<'_>> {
    let sheet = self
      .sheets
      .iter()
      .find(|s| s.name == sheet)
      .ok_or_else(|| Error::NoSuchSheet(sheet.to_string()))?;
    Ok(Box::new(sheet.rows.iter().cloned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn json_workbook() {
    let json = r#"{"sheets": [
      {"name": "Criteria", "rows": [["Этап", "№"], ["Контакт", 1]]},
      {"name": "AI"}
    ]}"#;
    let wb = MemoryWorkbook::from_json(json.as_bytes()).unwrap();
    assert_eq!(wb.sheet_names(), vec!["Criteria", "AI"]);

    let rows: Vec<_> = wb.rows("Criteria").unwrap().collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1], Cell::Number(1.0));
    assert_eq!(wb.rows("AI").unwrap().count(), 0);
    assert!(matches!(wb.rows("Nope"), Err(Error::NoSuchSheet(_))));
  }
}
