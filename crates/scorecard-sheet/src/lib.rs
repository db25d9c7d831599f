//! Spreadsheet parsing for the call-scorecard engine.
//!
//! Turns a two-sheet workbook (a criteria taxonomy sheet and a wide per-call
//! data sheet) into [`scorecard_core`] domain values. Pure synchronous; no
//! database or HTTP dependencies, and no logging: problems come back as
//! values ([`Error`], [`Warning`], [`RowParseError`]) for the caller to report.
//!
//! # Quick start
//!
//! ```no_run
//! use scorecard_sheet::{
//!   DefaultVocabulary, MemoryWorkbook, Workbook, locate_any, parse_taxonomy,
//!   row,
//! };
//!
//! let wb = MemoryWorkbook::new().with_sheet("Criteria", vec![
//!   row!["Этап", "№", "Название", "Prompt", "В итог"],
//!   row!["Установление контакта", 1, "Приветствие", "prompt", "Да"],
//! ]);
//! let vocabulary = DefaultVocabulary;
//! let names = wb.sheet_names();
//! let sheet = locate_any(&names, &["criteria"]).unwrap();
//! let parsed = parse_taxonomy(wb.rows(sheet).unwrap(), &vocabulary);
//! println!("{} criteria", parsed.criteria.len());
//! ```

pub mod cell;
pub mod columns;
pub mod error;
pub mod locate;
pub mod records;
pub mod taxonomy;
pub mod vocabulary;
pub mod workbook;
pub mod xlsx;

pub use cell::Cell;
pub use columns::{ColumnMap, ColumnRole, ColumnTriple, HeaderRows, classify_columns, read_header_rows};
pub use error::{Error, Result, RowParseError, Warning};
pub use locate::{SheetPair, locate, locate_any, locate_sheets};
pub use records::{FIRST_DATA_ROW, RecordBuilder};
pub use taxonomy::{ParsedCriterion, ParsedTaxonomy, parse_taxonomy};
pub use vocabulary::{DefaultVocabulary, Vocabulary, fold};
pub use workbook::{MemoryWorkbook, Rows, Sheet, Workbook};
pub use xlsx::XlsxWorkbook;
