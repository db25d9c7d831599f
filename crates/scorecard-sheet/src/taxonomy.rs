//! Criteria taxonomy sheet parser.
//!
//! Layout, one criterion per row after a single header row:
//!
//! | group (sparse) | number | name | prompt | in final score |
//!
//! A non-empty first cell opens a group that stays current until the next
//! one. The parser is a fold over the rows; the only state is the explicit
//! [`Accumulator`].

use std::collections::HashSet;

use scorecard_core::taxonomy::{NewCriteriaGroup, NewCriterion};

use crate::{
  cell::{Cell, EMPTY},
  error::Warning,
  vocabulary::{Vocabulary, fold},
};

const GROUP_COL: usize = 0;
const NUMBER_COL: usize = 1;
const NAME_COL: usize = 2;
const PROMPT_COL: usize = 3;
const IN_FINAL_COL: usize = 4;

/// A criterion together with the name of the group it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCriterion {
  pub group_name: String,
  /// 1-based row in the taxonomy sheet.
  pub row:        usize,
  pub criterion:  NewCriterion,
}

/// The groups and criteria read from a taxonomy sheet, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTaxonomy {
  pub groups:   Vec<NewCriteriaGroup>,
  pub criteria: Vec<ParsedCriterion>,
  pub warnings: Vec<Warning>,
}

/// Parse the rows of a taxonomy sheet. The first row is the header and is
/// skipped.
pub fn parse_taxonomy<I>(rows: I, vocabulary: &dyn Vocabulary) -> ParsedTaxonomy
where
  I: IntoIterator<Item = Vec<Cell>>,
{
  rows
    .into_iter()
    .enumerate()
    .skip(1)
    .fold(Accumulator::default(), |acc, (index, row)| {
      acc.step(index + 1, &row, vocabulary)
    })
    .finish()
}

// ─── Fold state ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct Accumulator {
  groups:        Vec<NewCriteriaGroup>,
  criteria:      Vec<ParsedCriterion>,
  warnings:      Vec<Warning>,
  /// Index into `groups`.
  current_group: Option<usize>,
  /// (group index, criterion number) pairs already taken.
  taken:         HashSet<(usize, u32)>,
}

impl Accumulator {
  fn step(mut self, row_number: usize, row: &[Cell], vocabulary: &dyn Vocabulary) -> Self {
    let cell = |i: usize| row.get(i).unwrap_or(&EMPTY);

    if let Some(name) = cell(GROUP_COL).text() {
      self.current_group = Some(self.group_index(&name));
    }

    let number_cell = cell(NUMBER_COL);
    if number_cell.is_empty() {
      return self;
    }

    let Some(number) = number_cell
      .as_integer()
      .and_then(|n| u32::try_from(n).ok())
    else {
      self.warnings.push(Warning::InvalidCriterionNumber {
        row:   row_number,
        value: number_cell.text().unwrap_or_default(),
      });
      return self;
    };

    let Some(name) = cell(NAME_COL).text() else {
      self.warnings.push(Warning::MissingCriterionName {
        row: row_number,
        number,
      });
      return self;
    };

    let group = match self.current_group {
      Some(index) => index,
      None => self.group_index(vocabulary.ungrouped_name()),
    };

    if !self.taken.insert((group, number)) {
      self.warnings.push(Warning::DuplicateCriterionNumber {
        row: row_number,
        group: self.groups[group].name.clone(),
        number,
      });
      return self;
    }

    let in_final_score = cell(IN_FINAL_COL)
      .text()
      .and_then(|v| vocabulary.yes_no(&fold(&v)))
      .unwrap_or(true);

    let criterion = NewCriterion {
      number,
      score_type: vocabulary.score_type(&fold(&name)),
      name,
      prompt: cell(PROMPT_COL).text(),
      in_final_score,
      order: self.criteria.len() as u32,
    };

    self.criteria.push(ParsedCriterion {
      group_name: self.groups[group].name.clone(),
      row: row_number,
      criterion,
    });
    self
  }

  /// Index of the group called `name`, appending it if new. A repeated group
  /// name re-enters the existing group.
  fn group_index(&mut self, name: &str) -> usize {
    if let Some(index) = self.groups.iter().position(|g| g.name == name) {
      return index;
    }
    self.groups.push(NewCriteriaGroup {
      name:  name.to_string(),
      order: self.groups.len() as u32,
    });
    self.groups.len() - 1
  }

  fn finish(self) -> ParsedTaxonomy {
    ParsedTaxonomy {
      groups:   self.groups,
      criteria: self.criteria,
      warnings: self.warnings,
    }
  }
}
