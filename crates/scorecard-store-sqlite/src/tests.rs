//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use scorecard_core::{
  call::{CallScoreEntry, Metadata, NewCall, ParsedCall, ScoreValue},
  report::UpsertOutcome,
  store::ScoreStore,
  taxonomy::{NewCriteriaGroup, NewCriterion, ScoreType},
};
use serde_json::json;
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn group(name: &str, order: u32) -> NewCriteriaGroup {
  NewCriteriaGroup {
    name: name.into(),
    order,
  }
}

// ─── Taxonomy ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn group_upsert_is_idempotent() {
  let s = store().await;
  let project = Uuid::new_v4();

  let first = s.upsert_criteria_group(project, group("Контакт", 0)).await.unwrap();
  assert_eq!(first.outcome, UpsertOutcome::Created);

  let again = s.upsert_criteria_group(project, group("Контакт", 0)).await.unwrap();
  assert_eq!(again.outcome, UpsertOutcome::Unchanged);
  assert_eq!(again.id, first.id);

  let moved = s.upsert_criteria_group(project, group("Контакт", 3)).await.unwrap();
  assert_eq!(moved.outcome, UpsertOutcome::Updated);
  assert_eq!(moved.id, first.id);
}

#[tokio::test]
async fn groups_are_scoped_per_project() {
  let s = store().await;
  let a = s.upsert_criteria_group(Uuid::new_v4(), group("Контакт", 0)).await.unwrap();
  let b = s.upsert_criteria_group(Uuid::new_v4(), group("Контакт", 0)).await.unwrap();
  assert_eq!(b.outcome, UpsertOutcome::Created);
  assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn criterion_upsert_detects_changes() {
  let s = store().await;
  let project = Uuid::new_v4();
  let g = s.upsert_criteria_group(project, group("Контакт", 0)).await.unwrap();

  let c = NewCriterion::new(1, "Приветствие", 0);
  let created = s.upsert_criterion(g.id, c.clone()).await.unwrap();
  assert_eq!(created.outcome, UpsertOutcome::Created);

  let same = s.upsert_criterion(g.id, c.clone()).await.unwrap();
  assert_eq!(same.outcome, UpsertOutcome::Unchanged);

  let reworded = NewCriterion {
    prompt: Some("Поздоровался ли менеджер?".into()),
    in_final_score: false,
    ..c
  };
  let updated = s.upsert_criterion(g.id, reworded).await.unwrap();
  assert_eq!(updated.outcome, UpsertOutcome::Updated);
  assert_eq!(updated.id, created.id);

  let taxonomy = s.load_taxonomy(project).await.unwrap();
  assert_eq!(taxonomy.criteria.len(), 1);
  assert!(!taxonomy.criteria[0].in_final_score);
  assert_eq!(
    taxonomy.criteria[0].prompt.as_deref(),
    Some("Поздоровался ли менеджер?")
  );
}

#[tokio::test]
async fn criterion_for_missing_group_is_rejected() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s
    .upsert_criterion(missing, NewCriterion::new(1, "x", 0))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::GroupNotFound(id) if id == missing));
}

#[tokio::test]
async fn load_taxonomy_orders_groups_and_criteria() {
  let s = store().await;
  let project = Uuid::new_v4();

  let close = s.upsert_criteria_group(project, group("Закрытие", 1)).await.unwrap();
  let open = s.upsert_criteria_group(project, group("Контакт", 0)).await.unwrap();

  s.upsert_criterion(close.id, NewCriterion::new(9, "Прощание", 2)).await.unwrap();
  s.upsert_criterion(open.id, NewCriterion::new(2, "Имя", 1)).await.unwrap();
  s.upsert_criterion(open.id, NewCriterion {
    score_type: ScoreType::Tag,
    ..NewCriterion::new(1, "Тег приветствия", 0)
  })
  .await
  .unwrap();

  let taxonomy = s.load_taxonomy(project).await.unwrap();
  let groups: Vec<&str> = taxonomy.groups.iter().map(|g| g.name.as_str()).collect();
  assert_eq!(groups, vec!["Контакт", "Закрытие"]);
  let numbers: Vec<u32> = taxonomy.criteria.iter().map(|c| c.number).collect();
  assert_eq!(numbers, vec![1, 2, 9]);
  assert_eq!(taxonomy.criteria[0].score_type, ScoreType::Tag);

  assert!(s.load_taxonomy(Uuid::new_v4()).await.unwrap().is_empty());
}

// ─── Calls ───────────────────────────────────────────────────────────────────

fn call(project_id: Uuid, external_id: &str, score: f64) -> NewCall {
  let mut metadata = Metadata::new();
  metadata.insert("call_id".into(), json!(external_id));
  metadata.insert("manager_name".into(), json!("Иванов"));
  metadata.insert("call_date".into(), json!("2025-01-12 10:30:00"));
  metadata.insert("duration".into(), json!(3));

  let parsed = ParsedCall {
    row_number: 4,
    external_id: Some(external_id.into()),
    metadata,
    scores: vec![
      CallScoreEntry {
        criterion_number: 1,
        value:            ScoreValue::Numeric(score),
        reason:           Some("clear greeting".into()),
        quote:            Some("hello".into()),
      },
      CallScoreEntry {
        criterion_number: 2,
        value:            ScoreValue::Tag("Да".into()),
        reason:           None,
        quote:            None,
      },
    ],
    final_percent: Some(87.5),
  };
  NewCall::from_parsed(project_id, parsed).expect("external id present")
}

#[tokio::test]
async fn call_upsert_create_skip_update() {
  let s = store().await;
  let project = Uuid::new_v4();

  let created = s.upsert_call(call(project, "c-1", 5.0)).await.unwrap();
  assert_eq!(created.outcome, UpsertOutcome::Created);

  let skipped = s.upsert_call(call(project, "c-1", 5.0)).await.unwrap();
  assert_eq!(skipped.outcome, UpsertOutcome::Unchanged);
  assert_eq!(skipped.id, created.id);

  let updated = s.upsert_call(call(project, "c-1", 3.0)).await.unwrap();
  assert_eq!(updated.outcome, UpsertOutcome::Updated);
  assert_eq!(updated.id, created.id);

  assert_eq!(s.count_calls(project).await.unwrap(), 1);
  let stored = s.get_call(project, "c-1").await.unwrap().unwrap();
  assert_eq!(stored.scores[0].value, ScoreValue::Numeric(3.0));
  assert_eq!(stored.scores.len(), 2);
}

#[tokio::test]
async fn update_replaces_the_score_set() {
  let s = store().await;
  let project = Uuid::new_v4();
  s.upsert_call(call(project, "c-1", 5.0)).await.unwrap();

  let mut fewer = call(project, "c-1", 5.0);
  fewer.scores.truncate(1);
  fewer.scores[0].reason = None;
  fewer.content_hash = "changed".into();
  s.upsert_call(fewer).await.unwrap();

  let stored = s.get_call(project, "c-1").await.unwrap().unwrap();
  assert_eq!(stored.scores.len(), 1);
  assert_eq!(stored.scores[0].reason, None);
  assert_eq!(stored.content_hash, "changed");
}

#[tokio::test]
async fn stored_call_round_trips_header_fields() {
  let s = store().await;
  let project = Uuid::new_v4();
  s.upsert_call(call(project, "c-1", 5.0)).await.unwrap();

  let stored = s.get_call(project, "c-1").await.unwrap().unwrap();
  assert_eq!(stored.project_id, project);
  assert_eq!(stored.manager_name.as_deref(), Some("Иванов"));
  assert_eq!(
    stored.call_date,
    NaiveDate::from_ymd_opt(2025, 1, 12)
      .unwrap()
      .and_hms_opt(10, 30, 0)
  );
  assert_eq!(stored.duration_seconds, Some(180));
  assert_eq!(stored.final_percent, Some(87.5));
  assert_eq!(stored.metadata.get("manager_name"), Some(&json!("Иванов")));
  assert_eq!(stored.scores[0].quote.as_deref(), Some("hello"));
  assert_eq!(stored.scores[1].value, ScoreValue::Tag("Да".into()));
}

#[tokio::test]
async fn managers_are_shared_across_calls() {
  let s = store().await;
  let project = Uuid::new_v4();
  s.upsert_call(call(project, "c-1", 5.0)).await.unwrap();
  s.upsert_call(call(project, "c-2", 4.0)).await.unwrap();

  let a = s.get_call(project, "c-1").await.unwrap().unwrap();
  let b = s.get_call(project, "c-2").await.unwrap().unwrap();
  assert_eq!(a.manager_name, b.manager_name);
  assert_eq!(s.count_calls(project).await.unwrap(), 2);
}

#[tokio::test]
async fn same_external_id_in_other_project_is_separate() {
  let s = store().await;
  let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
  s.upsert_call(call(a, "c-1", 5.0)).await.unwrap();
  let other = s.upsert_call(call(b, "c-1", 5.0)).await.unwrap();
  assert_eq!(other.outcome, UpsertOutcome::Created);
  assert!(s.get_call(a, "missing").await.unwrap().is_none());
}
