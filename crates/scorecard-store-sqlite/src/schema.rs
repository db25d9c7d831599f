//! SQL schema for the scorecard SQLite store.
//!
//! Executed once at connection startup. Every table is keyed the way the
//! upserts look rows up, so the unique constraints double as the idempotency
//! keys.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS criteria_groups (
    group_id    TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL,
    name        TEXT NOT NULL,
    sort_order  INTEGER NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (project_id, name)
);

CREATE TABLE IF NOT EXISTS criteria (
    criterion_id   TEXT PRIMARY KEY,
    group_id       TEXT NOT NULL REFERENCES criteria_groups(group_id),
    number         INTEGER NOT NULL,
    name           TEXT NOT NULL,
    prompt         TEXT,
    in_final_score INTEGER NOT NULL,
    score_type     TEXT NOT NULL,   -- 'numeric' | 'tag' | 'recommendation'
    sort_order     INTEGER NOT NULL,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    UNIQUE (group_id, number)
);

CREATE TABLE IF NOT EXISTS managers (
    manager_id  TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (project_id, name)
);

CREATE TABLE IF NOT EXISTS calls (
    call_id          TEXT PRIMARY KEY,
    project_id       TEXT NOT NULL,
    external_id      TEXT NOT NULL,
    manager_id       TEXT REFERENCES managers(manager_id),
    call_date        TEXT,            -- naive ISO 8601
    call_week        TEXT,
    duration_seconds INTEGER,
    final_percent    REAL,
    metadata_json    TEXT NOT NULL DEFAULT '{}',
    content_hash     TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    UNIQUE (project_id, external_id)
);

-- Replaced wholesale whenever the owning call's content hash changes.
CREATE TABLE IF NOT EXISTS call_scores (
    call_id          TEXT NOT NULL REFERENCES calls(call_id) ON DELETE CASCADE,
    criterion_number INTEGER NOT NULL,
    value_kind       TEXT NOT NULL,   -- 'numeric' | 'tag' | 'text'
    normalized_value TEXT NOT NULL,
    reason           TEXT,
    quote            TEXT,
    position         INTEGER NOT NULL,
    PRIMARY KEY (call_id, criterion_number)
);

CREATE INDEX IF NOT EXISTS criteria_group_idx ON criteria(group_id);
CREATE INDEX IF NOT EXISTS calls_project_idx  ON calls(project_id);
CREATE INDEX IF NOT EXISTS calls_date_idx     ON calls(call_date);

PRAGMA user_version = 1;
";
