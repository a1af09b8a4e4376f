//! SQL schema for the Hanna SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS projects (
    project_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    start_date  TEXT NOT NULL,   -- YYYY-MM-DD
    end_date    TEXT,            -- NULL = ongoing
    geometry    TEXT             -- GeoJSON geometry or NULL
);

-- A project's type is whichever of these holds a row for it. Exactly one is
-- expected; anything else reads back as type 'unknown'.
CREATE TABLE IF NOT EXISTS investment_projects (
    project_id TEXT PRIMARY KEY REFERENCES projects(project_id)
);

CREATE TABLE IF NOT EXISTS maintenance_projects (
    project_id TEXT PRIMARY KEY REFERENCES projects(project_id)
);

CREATE TABLE IF NOT EXISTS detailplan_projects (
    project_id TEXT PRIMARY KEY REFERENCES projects(project_id)
);

CREATE TABLE IF NOT EXISTS project_objects (
    object_id             TEXT PRIMARY KEY,
    project_id            TEXT NOT NULL REFERENCES projects(project_id),
    name                  TEXT NOT NULL,
    description           TEXT,
    object_types          TEXT NOT NULL DEFAULT '[]',   -- JSON array of codes
    object_categories     TEXT NOT NULL DEFAULT '[]',
    object_usages         TEXT NOT NULL DEFAULT '[]',
    lifecycle_state       TEXT NOT NULL,
    object_stage          TEXT NOT NULL,
    rakennuttaja_user     TEXT,
    suunnitteluttaja_user TEXT,
    start_date            TEXT NOT NULL,
    end_date              TEXT,
    geometry              TEXT,
    deleted               INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS project_object_user_roles (
    object_id TEXT NOT NULL REFERENCES project_objects(object_id),
    user_id   TEXT NOT NULL,
    role_id   TEXT NOT NULL,
    PRIMARY KEY (object_id, user_id, role_id)
);

CREATE INDEX IF NOT EXISTS project_objects_project_idx ON project_objects(project_id);
CREATE INDEX IF NOT EXISTS project_objects_deleted_idx ON project_objects(deleted);
CREATE INDEX IF NOT EXISTS user_roles_user_idx         ON project_object_user_roles(user_id);

PRAGMA user_version = 1;
";
