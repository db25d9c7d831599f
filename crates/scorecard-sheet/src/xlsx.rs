//! `.xlsx` adapter over [`calamine`].
//!
//! Opening a workbook reads only its directory. A worksheet is decoded the
//! first time it is asked for and cached, so sheets the parser never touches
//! cost nothing. Rows are converted to [`Cell`]s one at a time as the parser
//! pulls them.

use std::{
  collections::HashMap,
  io::Cursor,
  path::Path,
  sync::{Arc, Mutex, PoisonError},
};

use calamine::{Data, DataType as _, Range, Reader, Xlsx};

use crate::{
  cell::Cell,
  error::{Error, Result},
  workbook::{Rows, Workbook},
};

struct Inner {
  reader: Xlsx<Cursor<Vec<u8>>>,
  loaded: HashMap<String, Arc<Range<Data>>>,
}

pub struct XlsxWorkbook {
  names: Vec<String>,
  inner: Mutex<Inner>,
}

impl XlsxWorkbook {
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
      .map_err(|e| Error::Workbook(format!("{}: {e}", path.display())))?;
    Self::from_bytes(bytes)
  }

  pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
    let reader = Xlsx::new(Cursor::new(bytes))
      .map_err(|e| Error::Workbook(e.to_string()))?;
    Ok(Self {
      names: reader.sheet_names(),
      inner: Mutex::new(Inner {
        reader,
        loaded: HashMap::new(),
      }),
    })
  }

  /// Decode `sheets` now rather than on first read.
  pub fn preload(&self, sheets: &[&str]) -> Result<()> {
    for sheet in sheets {
      self.range(sheet)?;
    }
    Ok(())
  }

  /// Whether `sheet` has been decoded yet.
  pub fn is_loaded(&self, sheet: &str) -> bool {
    self.lock().loaded.contains_key(sheet)
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn range(&self, sheet: &str) -> Result<Arc<Range<Data>>> {
    if !self.names.iter().any(|name| name == sheet) {
      return Err(Error::NoSuchSheet(sheet.to_string()));
    }
    let mut inner = self.lock();
    if let Some(range) = inner.loaded.get(sheet) {
      return Ok(range.clone());
    }
    let range = inner
      .reader
      .worksheet_range(sheet)
      .map_err(|e| Error::Workbook(format!("sheet {sheet:?}: {e}")))?;
    let range = Arc::new(range);
    inner.loaded.insert(sheet.to_string(), range.clone());
    Ok(range)
  }
}

impl Workbook for XlsxWorkbook {
  fn sheet_names(&self) -> Vec<String> { self.names.clone() }

  fn rows(&self, sheet: &str) -> Result<Rows<'_>> {
    let range = self.range(sheet)?;

    // calamine trims leading empty rows and columns; restore them so column
    // and row positions match the sheet.
    let (row_offset, col_offset) = range
      .start()
      .map_or((0, 0), |(r, c)| (r as usize, c as usize));
    let (height, width) = range.get_size();

    let leading = std::iter::repeat_with(Vec::new).take(row_offset);
    let body = (0..height).map(move |r| {
      let mut row = Vec::with_capacity(col_offset + width);
      row.resize(col_offset, Cell::Empty);
      row.extend((0..width).map(|c| range.get((r, c)).map_or(Cell::Empty, convert)));
      row
    });
    Ok(Box::new(leading.chain(body)))
  }
}

fn convert(data: &Data) -> Cell {
  match data {
    Data::Empty | Data::Error(_) => Cell::Empty,
    Data::Int(i) => Cell::Number(*i as f64),
    Data::Float(f) => Cell::Number(*f),
    Data::String(s) => Cell::Text(s.clone()),
    Data::Bool(b) => Cell::Text(b.to_string()),
    Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    Data::DateTime(dt) => match data.as_datetime() {
      Some(naive) => Cell::Text(naive.format("%Y-%m-%dT%H:%M:%S").to_string()),
      None => Cell::Number(dt.as_f64()),
    },
  }
}

#[cfg(test)]
mod tests {
  use calamine::CellErrorType;

  use super::*;

  #[test]
  fn converts_scalar_cells() {
    assert_eq!(convert(&Data::Int(5)), Cell::Number(5.0));
    assert_eq!(convert(&Data::Float(87.5)), Cell::Number(87.5));
    assert_eq!(convert(&Data::String("Да".into())), Cell::Text("Да".into()));
    assert_eq!(convert(&Data::Bool(true)), Cell::Text("true".into()));
    assert_eq!(convert(&Data::Error(CellErrorType::Div0)), Cell::Empty);
    assert_eq!(convert(&Data::Empty), Cell::Empty);
  }

  const FIXTURE: &[u8] = include_bytes!("../tests/fixtures/scorecard.xlsx");

  #[test]
  fn sheets_are_decoded_on_first_read() {
    let wb = XlsxWorkbook::from_bytes(FIXTURE.to_vec()).unwrap();
    assert_eq!(wb.sheet_names(), vec!["Summary", "Criteria", "AI"]);
    assert!(!wb.is_loaded("Criteria"));

    let rows: Vec<_> = wb.rows("Criteria").unwrap().collect();
    assert_eq!(rows[0][0], Cell::Text("Этап".into()));
    assert_eq!(rows[1][1], Cell::Number(1.0));
    assert!(wb.is_loaded("Criteria"));
    assert!(!wb.is_loaded("Summary"));
    assert!(!wb.is_loaded("AI"));

    wb.preload(&["AI"]).unwrap();
    assert!(wb.is_loaded("AI"));
    assert!(!wb.is_loaded("Summary"));
    assert!(matches!(wb.preload(&["Nope"]), Err(Error::NoSuchSheet(_))));
  }

  #[test]
  fn leading_blank_columns_keep_their_positions() {
    let wb = XlsxWorkbook::from_bytes(FIXTURE.to_vec()).unwrap();
    let rows: Vec<_> = wb.rows("Summary").unwrap().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].is_empty());
    assert_eq!(rows[1], vec![Cell::Empty, Cell::Text("ignored".into())]);
  }

  #[test]
  fn rejects_non_xlsx_bytes() {
    let err = XlsxWorkbook::from_bytes(b"not a workbook".to_vec())
      .err()
      .unwrap();
    assert!(matches!(err, Error::Workbook(_)));
  }
}
