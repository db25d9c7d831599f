//! End-to-end ingestion tests against an in-memory SQLite store.

use std::sync::Arc;

use scorecard_core::{
  call::{Metadata, ScoreValue},
  store::ScoreStore,
};
use scorecard_sheet::{Cell, MemoryWorkbook, row};
use scorecard_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{CancelFlag, Error, Ingestor, MISSING_CALL_ID};

async fn ingestor() -> Ingestor<SqliteStore> {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  Ingestor::new(Arc::new(store))
}

fn criteria_sheet() -> Vec<Vec<Cell>> {
  vec![
    row!["Этап", "№", "Критерий", "Prompt", "Оценка 100%"],
    row!["Установление контакта", 1, "Приветствие", "prompt", "Да"],
    row![None::<&str>, 2, "Имя", None::<&str>, "Нет"],
    row!["Закрытие", 3, "Прощание", None::<&str>, "Да"],
  ]
}

fn ai_header() -> Vec<Vec<Cell>> {
  vec![
    row![
      "id_item_set", "user_name", "call_date", "c1", "c1_reason", "c1_quote",
      "c2", "c3", "c12", "final"
    ],
    row![
      None::<&str>, None::<&str>, None::<&str>, "Установление контакта",
      None::<&str>, None::<&str>, None::<&str>, "Закрытие"
    ],
    row![
      "Call ID",
      "Менеджер",
      "Дата звонка",
      "1 Приветствие",
      "1 Приветствие Reason",
      "1 Приветствие Quote",
      "2 Имя",
      "3 Прощание",
      "12 Reason",
      "FINAL Average Call Percent"
    ],
  ]
}

fn ai_sheet(data: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
  let mut rows = ai_header();
  rows.extend(data);
  rows
}

fn workbook(data: Vec<Vec<Cell>>) -> MemoryWorkbook {
  MemoryWorkbook::new()
    .with_sheet("Summary", vec![row!["ignored"]])
    .with_sheet("Criteria 10.12", criteria_sheet())
    .with_sheet("AI", ai_sheet(data))
}

fn two_calls() -> Vec<Vec<Cell>> {
  vec![
    row![
      "c-1", "Иванов", "12.01.2025", 5, "clear greeting", "\"hello\"", "Да", 4,
      "ignored", 87.5
    ],
    row![
      "c-2", "Петров", "13.01.2025", 3, None::<&str>, None::<&str>, "Нет", 5,
      None::<&str>, 0.6
    ],
  ]
}

// ─── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_run_creates_taxonomy_and_calls() {
  let ing = ingestor().await;
  let project = Uuid::new_v4();

  let report = ing.ingest(project, &workbook(two_calls())).await.unwrap();

  assert_eq!(report.groups_created, 2);
  assert_eq!(report.criteria_created, 3);
  assert_eq!(report.calls_created, 2);
  assert_eq!(report.calls_skipped_duplicate, 0);
  assert!(report.row_errors.is_empty());
  assert!(!report.cancelled);
  assert_eq!(report.warnings.len(), 1);
  assert!(report.warnings[0].contains("12 Reason"));

  let store = ing.store();
  let call = store.get_call(project, "c-1").await.unwrap().unwrap();
  assert_eq!(call.manager_name.as_deref(), Some("Иванов"));
  assert_eq!(call.final_percent, Some(87.5));

  let numbers: Vec<u32> = call.scores.iter().map(|s| s.criterion_number).collect();
  assert_eq!(numbers, vec![1, 2, 3]);
  let greeting = &call.scores[0];
  assert_eq!(greeting.value, ScoreValue::Numeric(5.0));
  assert_eq!(greeting.reason.as_deref(), Some("clear greeting"));
  assert_eq!(greeting.quote.as_deref(), Some("hello"));
  assert_eq!(call.scores[1].value, ScoreValue::Tag("Да".into()));

  let second = store.get_call(project, "c-2").await.unwrap().unwrap();
  assert_eq!(second.final_percent, Some(60.0));

  let taxonomy = store.load_taxonomy(project).await.unwrap();
  let in_final: Vec<bool> = taxonomy.criteria.iter().map(|c| c.in_final_score).collect();
  assert_eq!(in_final, vec![true, false, true]);
}

#[tokio::test]
async fn rerun_of_unchanged_workbook_is_a_no_op() {
  let ing = ingestor().await;
  let project = Uuid::new_v4();
  let wb = workbook(two_calls());

  ing.ingest(project, &wb).await.unwrap();
  let again = ing.ingest(project, &wb).await.unwrap();

  assert_eq!(again.groups_created, 0);
  assert_eq!(again.criteria_created, 0);
  assert_eq!(again.criteria_updated, 0);
  assert_eq!(again.calls_created, 0);
  assert_eq!(again.calls_updated, 0);
  assert_eq!(again.calls_skipped_duplicate, 2);
  assert_eq!(ing.store().count_calls(project).await.unwrap(), 2);
}

#[tokio::test]
async fn changed_scores_overwrite_the_stored_call() {
  let ing = ingestor().await;
  let project = Uuid::new_v4();
  ing.ingest(project, &workbook(two_calls())).await.unwrap();

  let mut rescored = two_calls();
  rescored[0][3] = Cell::Number(2.0);
  rescored[0][4] = Cell::Empty;
  let report = ing.ingest(project, &workbook(rescored)).await.unwrap();

  assert_eq!(report.calls_updated, 1);
  assert_eq!(report.calls_skipped_duplicate, 1);

  let call = ing.store().get_call(project, "c-1").await.unwrap().unwrap();
  assert_eq!(call.scores[0].value, ScoreValue::Numeric(2.0));
  assert_eq!(call.scores[0].reason, None);
}

// ─── Row-scoped problems ─────────────────────────────────────────────────────

#[tokio::test]
async fn bad_rows_are_reported_and_the_batch_continues() {
  let ing = ingestor().await;
  let project = Uuid::new_v4();

  let mut data = two_calls();
  data.insert(1, row![None::<&str>, "Сидоров", None::<&str>, 4]);
  data.insert(2, row![]);
  data.insert(3, row!["c-9", None::<&str>, None::<&str>, 4, None::<&str>,
    None::<&str>, None::<&str>, None::<&str>, None::<&str>, "не посчитано"]);

  let report = ing.ingest(project, &workbook(data)).await.unwrap();

  assert_eq!(report.calls_created, 2);
  let errors: Vec<(usize, &str)> = report
    .row_errors
    .iter()
    .map(|e| (e.row_number, e.reason.as_str()))
    .collect();
  assert_eq!(errors.len(), 2);
  assert_eq!(errors[0], (5, MISSING_CALL_ID));
  assert_eq!(errors[1].0, 7);
  assert!(errors[1].1.contains("не посчитано"));
}

#[tokio::test]
async fn duplicate_criterion_number_keeps_the_first() {
  let ing = ingestor().await;
  let project = Uuid::new_v4();

  let mut criteria = criteria_sheet();
  criteria.push(row![None::<&str>, 3, "Повтор", None::<&str>, "Нет"]);
  let wb = MemoryWorkbook::new()
    .with_sheet("Criteria", criteria)
    .with_sheet("AI", ai_sheet(two_calls()));

  let report = ing.ingest(project, &wb).await.unwrap();
  assert_eq!(report.criteria_created, 3);
  assert!(report.warnings.iter().any(|w| w.contains("criterion 3 already exists")));

  let taxonomy = ing.store().load_taxonomy(project).await.unwrap();
  let last = taxonomy.criterion(3).unwrap();
  assert_eq!(last.name, "Прощание");
}

// ─── Fatal errors ────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_data_sheet_aborts_before_any_write() {
  let ing = ingestor().await;
  let project = Uuid::new_v4();
  let wb = MemoryWorkbook::new().with_sheet("Criteria", criteria_sheet());

  let err = ing.ingest(project, &wb).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Sheet(scorecard_sheet::Error::SheetNotFound { .. })
  ));
  assert!(ing.store().load_taxonomy(project).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_taxonomy_sheet_is_fatal() {
  let ing = ingestor().await;
  let wb = MemoryWorkbook::new().with_sheet("AI", ai_sheet(two_calls()));
  let err = ing.ingest(Uuid::new_v4(), &wb).await.unwrap_err();
  assert!(matches!(err, Error::Sheet(_)));
}

#[tokio::test]
async fn taxonomy_without_criteria_is_fatal() {
  let ing = ingestor().await;
  let project = Uuid::new_v4();
  let wb = MemoryWorkbook::new()
    .with_sheet("Критерии", vec![row!["Этап", "№"], row!["Контакт"]])
    .with_sheet("AI", ai_sheet(two_calls()));

  let err = ing.ingest(project, &wb).await.unwrap_err();
  assert!(matches!(err, Error::EmptyTaxonomy { ref sheet } if sheet == "Критерии"));
  assert_eq!(ing.store().count_calls(project).await.unwrap(), 0);
}

#[tokio::test]
async fn truncated_data_header_is_fatal() {
  let ing = ingestor().await;
  let wb = MemoryWorkbook::new()
    .with_sheet("Criteria", criteria_sheet())
    .with_sheet("AI", vec![row!["id_item_set"]]);
  let err = ing.ingest(Uuid::new_v4(), &wb).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Sheet(scorecard_sheet::Error::MissingHeaderRows { found: 1, .. })
  ));
}

// ─── Cancellation and concurrency ────────────────────────────────────────────

#[tokio::test]
async fn cancelled_run_stops_before_the_next_row() {
  let ing = ingestor().await;
  let project = Uuid::new_v4();
  let cancel = CancelFlag::new();
  cancel.cancel();

  let report = ing
    .ingest_with_cancel(project, &workbook(two_calls()), &cancel)
    .await
    .unwrap();

  assert!(report.cancelled);
  assert_eq!(report.calls_processed(), 0);
  assert_eq!(report.criteria_created, 3);

  // Re-running picks up where the cancelled run left off.
  let report = ing.ingest(project, &workbook(two_calls())).await.unwrap();
  assert_eq!(report.calls_created, 2);
}

#[tokio::test]
async fn projects_ingest_independently_in_parallel() {
  let ing = ingestor().await;
  let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
  let wb = workbook(two_calls());

  let other = ing.clone();
  let (ra, rb) = tokio::join!(ing.ingest(a, &wb), other.ingest(b, &wb));
  assert_eq!(ra.unwrap().calls_created, 2);
  assert_eq!(rb.unwrap().calls_created, 2);
}

#[tokio::test]
async fn concurrent_uploads_to_one_project_are_serialized() {
  let ing = ingestor().await;
  let project = Uuid::new_v4();
  let wb = Arc::new(workbook(two_calls()));

  let handles: Vec<_> = (0..2)
    .map(|_| {
      let ing = ing.clone();
      let wb = wb.clone();
      tokio::spawn(async move { ing.ingest(project, wb.as_ref()).await })
    })
    .collect();

  let mut created = 0;
  let mut skipped = 0;
  let mut criteria_created = 0;
  for handle in handles {
    let report = handle.await.unwrap().unwrap();
    created += report.calls_created;
    skipped += report.calls_skipped_duplicate;
    criteria_created += report.criteria_created;
  }
  assert_eq!((created, skipped), (2, 2));
  assert_eq!(criteria_created, 3);
}

#[tokio::test]
async fn metadata_is_kept_on_the_stored_call() {
  let ing = ingestor().await;
  let project = Uuid::new_v4();
  ing.ingest(project, &workbook(two_calls())).await.unwrap();

  let call = ing.store().get_call(project, "c-2").await.unwrap().unwrap();
  let mut expected = Metadata::new();
  expected.insert("call_id".into(), "c-2".into());
  expected.insert("manager_name".into(), "Петров".into());
  expected.insert("call_date".into(), "13.01.2025".into());
  assert_eq!(call.metadata, expected);
  assert!(call.call_date.is_some());
}

#[tokio::test]
async fn system_keyed_export_with_repeated_header() {
  let ing = ingestor().await;
  let project = Uuid::new_v4();
  let human = row![
    "ID", "Сотрудник", "Сделка", "Приветствие", "Обоснование", "Имя", "Прощание",
    "Итоговый процент"
  ];
  let wb = MemoryWorkbook::new()
    .with_sheet("Критерии", criteria_sheet())
    .with_sheet("Звонки", vec![
      row![
        "id_item_set", "user_name", "lead_id", "score_0", "reason_0", "score_1",
        "score_2", "key_13"
      ],
      row![],
      human.clone(),
      human,
      row!["c-1", "Иванов", 9001, 5, "clear greeting", "Да", 4, 0.57],
    ]);

  let report = ing.ingest(project, &wb).await.unwrap();
  assert_eq!(report.calls_created, 1);
  assert!(report.row_errors.is_empty());

  let call = ing.store().get_call(project, "c-1").await.unwrap().unwrap();
  assert_eq!(call.final_percent, Some(57.0));
  assert_eq!(call.metadata.get("lead_id"), Some(&9001.into()));
  let numbers: Vec<u32> = call.scores.iter().map(|s| s.criterion_number).collect();
  assert_eq!(numbers, vec![1, 2, 3]);
  assert_eq!(call.scores[0].reason.as_deref(), Some("clear greeting"));
}
