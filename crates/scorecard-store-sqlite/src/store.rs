//! [`SqliteStore`], the SQLite implementation of [`ScoreStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use scorecard_core::{
  call::{NewCall, StoredCall},
  report::{UpsertOutcome, Upserted},
  store::ScoreStore,
  taxonomy::{NewCriteriaGroup, NewCriterion, Taxonomy},
};

use crate::{
  encode::{
    RawCall, RawCriterion, RawGroup, RawScore, ScoreRow, decode_uuid, encode_dt,
    encode_metadata, encode_naive, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A scorecard store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests and one-shot runs.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn upserted(id: &str, outcome: UpsertOutcome) -> Result<Upserted> {
  Ok(Upserted {
    id: decode_uuid(id)?,
    outcome,
  })
}

// ─── ScoreStore impl ─────────────────────────────────────────────────────────

impl ScoreStore for SqliteStore {
  type Error = Error;

  // ── Taxonomy ──────────────────────────────────────────────────────────────

  async fn upsert_criteria_group(
    &self,
    project_id: Uuid,
    group: NewCriteriaGroup,
  ) -> Result<Upserted> {
    let project_str = encode_uuid(project_id);
    let fresh_id    = encode_uuid(Uuid::new_v4());
    let order       = i64::from(group.order);
    let now         = encode_dt(Utc::now());
    let name        = group.name;

    let (id, outcome) = self
      .conn
      .call(move |conn| {
        let existing: Option<(String, i64)> = conn
          .query_row(
            "SELECT group_id, sort_order FROM criteria_groups
             WHERE project_id = ?1 AND name = ?2",
            rusqlite::params![project_str, name],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        match existing {
          Some((id, stored)) if stored == order => Ok((id, UpsertOutcome::Unchanged)),
          Some((id, _)) => {
            conn.execute(
              "UPDATE criteria_groups SET sort_order = ?2, updated_at = ?3
               WHERE group_id = ?1",
              rusqlite::params![id, order, now],
            )?;
            Ok((id, UpsertOutcome::Updated))
          }
          None => {
            conn.execute(
              "INSERT INTO criteria_groups
                 (group_id, project_id, name, sort_order, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
              rusqlite::params![fresh_id, project_str, name, order, now],
            )?;
            Ok((fresh_id, UpsertOutcome::Created))
          }
        }
      })
      .await?;

    upserted(&id, outcome)
  }

  async fn upsert_criterion(
    &self,
    group_id: Uuid,
    criterion: NewCriterion,
  ) -> Result<Upserted> {
    let group_str  = encode_uuid(group_id);
    let fresh_id   = encode_uuid(Uuid::new_v4());
    let now        = encode_dt(Utc::now());
    let number     = i64::from(criterion.number);
    let order      = i64::from(criterion.order);
    let score_type = criterion.score_type.as_str();
    let in_final   = criterion.in_final_score;
    let name       = criterion.name;
    let prompt     = criterion.prompt;

    let result: Option<(String, UpsertOutcome)> = self
      .conn
      .call(move |conn| {
        let group_exists = conn
          .query_row(
            "SELECT 1 FROM criteria_groups WHERE group_id = ?1",
            rusqlite::params![group_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !group_exists {
          return Ok(None);
        }

        type Stored = (String, String, Option<String>, bool, String, i64);
        let existing: Option<Stored> = conn
          .query_row(
            "SELECT criterion_id, name, prompt, in_final_score, score_type, sort_order
             FROM criteria WHERE group_id = ?1 AND number = ?2",
            rusqlite::params![group_str, number],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?)),
          )
          .optional()?;

        let outcome = match existing {
          Some((id, s_name, s_prompt, s_in_final, s_type, s_order))
            if s_name == name
              && s_prompt == prompt
              && s_in_final == in_final
              && s_type == score_type
              && s_order == order =>
          {
            (id, UpsertOutcome::Unchanged)
          }
          Some((id, ..)) => {
            conn.execute(
              "UPDATE criteria SET name = ?2, prompt = ?3, in_final_score = ?4,
                 score_type = ?5, sort_order = ?6, updated_at = ?7
               WHERE criterion_id = ?1",
              rusqlite::params![id, name, prompt, in_final, score_type, order, now],
            )?;
            (id, UpsertOutcome::Updated)
          }
          None => {
            conn.execute(
              "INSERT INTO criteria (
                 criterion_id, group_id, number, name, prompt, in_final_score,
                 score_type, sort_order, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
              rusqlite::params![
                fresh_id, group_str, number, name, prompt, in_final, score_type,
                order, now,
              ],
            )?;
            (fresh_id, UpsertOutcome::Created)
          }
        };
        Ok(Some(outcome))
      })
      .await?;

    let (id, outcome) = result.ok_or(Error::GroupNotFound(group_id))?;
    upserted(&id, outcome)
  }

  async fn load_taxonomy(&self, project_id: Uuid) -> Result<Taxonomy> {
    let project_str = encode_uuid(project_id);

    let (raw_groups, raw_criteria): (Vec<RawGroup>, Vec<RawCriterion>) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT group_id, project_id, name, sort_order
           FROM criteria_groups
           WHERE project_id = ?1
           ORDER BY sort_order, name",
        )?;
        let groups = stmt
          .query_map(rusqlite::params![project_str], |row| {
            Ok(RawGroup {
              group_id:   row.get(0)?,
              project_id: row.get(1)?,
              name:       row.get(2)?,
              sort_order: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT c.criterion_id, c.group_id, c.number, c.name, c.prompt,
                  c.in_final_score, c.score_type, c.sort_order
           FROM criteria c
           JOIN criteria_groups g ON g.group_id = c.group_id
           WHERE g.project_id = ?1
           ORDER BY g.sort_order, g.name, c.sort_order, c.number",
        )?;
        let criteria = stmt
          .query_map(rusqlite::params![project_str], |row| {
            Ok(RawCriterion {
              criterion_id:   row.get(0)?,
              group_id:       row.get(1)?,
              number:         row.get(2)?,
              name:           row.get(3)?,
              prompt:         row.get(4)?,
              in_final_score: row.get(5)?,
              score_type:     row.get(6)?,
              sort_order:     row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((groups, criteria))
      })
      .await?;

    Ok(Taxonomy {
      groups:   raw_groups
        .into_iter()
        .map(RawGroup::into_group)
        .collect::<Result<_>>()?,
      criteria: raw_criteria
        .into_iter()
        .map(RawCriterion::into_criterion)
        .collect::<Result<_>>()?,
    })
  }

  // ── Calls ─────────────────────────────────────────────────────────────────

  async fn upsert_call(&self, call: NewCall) -> Result<Upserted> {
    let project_str   = encode_uuid(call.project_id);
    let fresh_id      = encode_uuid(Uuid::new_v4());
    let manager_id    = encode_uuid(Uuid::new_v4());
    let now           = encode_dt(Utc::now());
    let metadata_json = encode_metadata(&call.metadata)?;
    let call_date     = call.call_date.map(encode_naive);
    let scores: Vec<ScoreRow> = call.scores.iter().map(ScoreRow::from).collect();
    let NewCall {
      external_id,
      manager_name,
      call_week,
      duration_seconds,
      final_percent,
      content_hash,
      ..
    } = call;

    let (id, outcome) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<(String, String)> = tx
          .query_row(
            "SELECT call_id, content_hash FROM calls
             WHERE project_id = ?1 AND external_id = ?2",
            rusqlite::params![project_str, external_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        if let Some((call_id, stored_hash)) = &existing {
          if *stored_hash == content_hash {
            return Ok((call_id.clone(), UpsertOutcome::Unchanged));
          }
        }

        let manager_id = match manager_name.as_deref() {
          Some(name) => {
            tx.execute(
              "INSERT OR IGNORE INTO managers (manager_id, project_id, name, created_at)
               VALUES (?1, ?2, ?3, ?4)",
              rusqlite::params![manager_id, project_str, name, now],
            )?;
            Some(tx.query_row(
              "SELECT manager_id FROM managers WHERE project_id = ?1 AND name = ?2",
              rusqlite::params![project_str, name],
              |r| r.get::<_, String>(0),
            )?)
          }
          None => None,
        };

        let (call_id, outcome) = match existing {
          Some((call_id, _)) => {
            tx.execute(
              "UPDATE calls SET
                 manager_id = ?2, call_date = ?3, call_week = ?4,
                 duration_seconds = ?5, final_percent = ?6, metadata_json = ?7,
                 content_hash = ?8, updated_at = ?9
               WHERE call_id = ?1",
              rusqlite::params![
                call_id,
                manager_id,
                call_date,
                call_week,
                duration_seconds,
                final_percent,
                metadata_json,
                content_hash,
                now,
              ],
            )?;
            tx.execute(
              "DELETE FROM call_scores WHERE call_id = ?1",
              rusqlite::params![call_id],
            )?;
            (call_id, UpsertOutcome::Updated)
          }
          None => {
            tx.execute(
              "INSERT INTO calls (
                 call_id, project_id, external_id, manager_id, call_date,
                 call_week, duration_seconds, final_percent, metadata_json,
                 content_hash, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
              rusqlite::params![
                fresh_id,
                project_str,
                external_id,
                manager_id,
                call_date,
                call_week,
                duration_seconds,
                final_percent,
                metadata_json,
                content_hash,
                now,
              ],
            )?;
            (fresh_id, UpsertOutcome::Created)
          }
        };

        {
          let mut stmt = tx.prepare(
            "INSERT INTO call_scores (
               call_id, criterion_number, value_kind, normalized_value,
               reason, quote, position
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for (position, s) in scores.iter().enumerate() {
            stmt.execute(rusqlite::params![
              call_id,
              s.criterion_number,
              s.value_kind,
              s.normalized_value,
              s.reason,
              s.quote,
              position as i64,
            ])?;
          }
        }

        tx.commit()?;
        Ok((call_id, outcome))
      })
      .await?;

    upserted(&id, outcome)
  }

  async fn get_call<'a>(
    &'a self,
    project_id: Uuid,
    external_id: &'a str,
  ) -> Result<Option<StoredCall>> {
    let project_str = encode_uuid(project_id);
    let external_id = external_id.to_owned();

    let raw: Option<(RawCall, Vec<RawScore>)> = self
      .conn
      .call(move |conn| {
        let call = conn
          .query_row(
            "SELECT c.call_id, c.project_id, c.external_id, m.name, c.call_date,
                    c.call_week, c.duration_seconds, c.final_percent,
                    c.metadata_json, c.content_hash, c.created_at, c.updated_at
             FROM calls c
             LEFT JOIN managers m ON m.manager_id = c.manager_id
             WHERE c.project_id = ?1 AND c.external_id = ?2",
            rusqlite::params![project_str, external_id],
            |row| {
              Ok(RawCall {
                call_id:          row.get(0)?,
                project_id:       row.get(1)?,
                external_id:      row.get(2)?,
                manager_name:     row.get(3)?,
                call_date:        row.get(4)?,
                call_week:        row.get(5)?,
                duration_seconds: row.get(6)?,
                final_percent:    row.get(7)?,
                metadata_json:    row.get(8)?,
                content_hash:     row.get(9)?,
                created_at:       row.get(10)?,
                updated_at:       row.get(11)?,
              })
            },
          )
          .optional()?;

        let Some(call) = call else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT criterion_number, value_kind, normalized_value, reason, quote
           FROM call_scores WHERE call_id = ?1 ORDER BY position",
        )?;
        let scores = stmt
          .query_map(rusqlite::params![call.call_id], |row| {
            Ok(RawScore {
              criterion_number: row.get(0)?,
              value_kind:       row.get(1)?,
              normalized_value: row.get(2)?,
              reason:           row.get(3)?,
              quote:            row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((call, scores)))
      })
      .await?;

    raw.map(|(call, scores)| call.into_call(scores)).transpose()
  }

  async fn count_calls(&self, project_id: Uuid) -> Result<usize> {
    let project_str = encode_uuid(project_id);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM calls WHERE project_id = ?1",
          rusqlite::params![project_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count as usize)
  }
}
