//! Find a sheet by fuzzy name match.

use crate::{
  error::{Error, Result},
  vocabulary::Vocabulary,
};

/// Return the first sheet whose name contains `keyword`, case-insensitively.
///
/// Tolerates suffixes such as "Criteria 10.12". A sheet whose whole name
/// equals the keyword wins over an earlier partial match, so "AI" beats
/// "Main" for the keyword `ai`.
pub fn locate<'a, S: AsRef<str>>(
  sheet_names: &'a [S],
  keyword: &str,
) -> Result<&'a str> {
  let keyword = keyword.trim().to_lowercase();
  let folded: Vec<(&'a str, String)> = sheet_names
    .iter()
    .map(|s| (s.as_ref(), s.as_ref().trim().to_lowercase()))
    .collect();

  folded
    .iter()
    .find(|(_, name)| *name == keyword)
    .or_else(|| folded.iter().find(|(_, name)| name.contains(&keyword)))
    .map(|(original, _)| *original)
    .ok_or_else(|| Error::SheetNotFound {
      wanted:    keyword,
      available: sheet_names.iter().map(|s| s.as_ref().to_string()).collect(),
    })
}

/// Try each keyword in turn and return the first sheet found.
pub fn locate_any<'a, S: AsRef<str>>(
  sheet_names: &'a [S],
  keywords: &[&str],
) -> Result<&'a str> {
  keywords
    .iter()
    .find_map(|k| locate(sheet_names, k).ok())
    .ok_or_else(|| Error::SheetNotFound {
      wanted:    keywords.join(" | "),
      available: sheet_names.iter().map(|s| s.as_ref().to_string()).collect(),
    })
}

/// The two sheets an ingestion run reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetPair<'a> {
  pub taxonomy: &'a str,
  pub data:     &'a str,
}

/// Locate both the taxonomy sheet and the data sheet, failing if either is
/// missing.
pub fn locate_sheets<'a, S: AsRef<str>>(
  sheet_names: &'a [S],
  vocabulary: &dyn Vocabulary,
) -> Result<SheetPair<'a>> {
  Ok(SheetPair {
    taxonomy: locate_any(sheet_names, vocabulary.taxonomy_sheet_keywords())?,
    data:     locate_any(sheet_names, vocabulary.data_sheet_keywords())?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vocabulary::DefaultVocabulary;

  #[test]
  fn substring_match_tolerates_suffixes() {
    let sheets = ["Summary", "Criteria 10.12", "AI"];
    assert_eq!(locate(&sheets, "criteria").unwrap(), "Criteria 10.12");
    assert_eq!(locate(&sheets, "CRITERIA").unwrap(), "Criteria 10.12");
  }

  #[test]
  fn exact_name_beats_earlier_substring() {
    let sheets = ["Main", "AI"];
    assert_eq!(locate(&sheets, "ai").unwrap(), "AI");
    let sheets = ["Main", "Other"];
    assert_eq!(locate(&sheets, "ai").unwrap(), "Main");
  }

  #[test]
  fn missing_sheet_is_reported_with_available_names() {
    let sheets = vec!["Summary".to_string(), "AI".to_string()];
    let err = locate(&sheets, "criteria").unwrap_err();
    match err {
      Error::SheetNotFound { wanted, available } => {
        assert_eq!(wanted, "criteria");
        assert_eq!(available, vec!["Summary", "AI"]);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn locate_any_falls_back_to_later_keywords() {
    let sheets = ["Критерии", "AI"];
    assert_eq!(
      locate_any(&sheets, &["criteria", "критери"]).unwrap(),
      "Критерии"
    );
    assert!(matches!(
      locate_any(&sheets, &["calls"]),
      Err(Error::SheetNotFound { .. })
    ));
  }

  #[test]
  fn data_sheet_falls_back_to_generic_names() {
    let sheets = ["Критерии 2024", "Звонки"];
    assert_eq!(locate_sheets(&sheets, &DefaultVocabulary).unwrap(), SheetPair {
      taxonomy: "Критерии 2024",
      data:     "Звонки",
    });

    let sheets = ["Criteria", "Calls export"];
    assert_eq!(locate_sheets(&sheets, &DefaultVocabulary).unwrap().data, "Calls export");

    let sheets = ["Criteria", "AI", "Raw data"];
    assert_eq!(locate_sheets(&sheets, &DefaultVocabulary).unwrap().data, "AI");
  }
}
