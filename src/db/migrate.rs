use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension};

/// Highest schema version this build knows how to create.
const CURRENT_SCHEMA_VERSION: i32 = 1;

const CORE_SCHEMA_VERSION: &str = "20250301_0001_core_schema";

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Check if a table exists.
fn table_exists(conn: &Connection, name: &str) -> AppResult<bool> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let exists: Option<String> = stmt.query_row([name], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

fn schema_version(conn: &Connection) -> AppResult<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Create totems / sessions / sensor_events / session_aggregates.
///
/// `sensor_events.value` carries no CHECK constraint: out-of-domain
/// readings must be storable so the cleaner can find and repair them.
fn create_core_tables(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        BEGIN;

        CREATE TABLE IF NOT EXISTS totems (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            totem_id  TEXT NOT NULL UNIQUE,
            location  TEXT NOT NULL DEFAULT '',
            status    TEXT NOT NULL DEFAULT 'active'
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id          TEXT NOT NULL UNIQUE,
            totem_id            TEXT NOT NULL,
            started_at          TEXT NOT NULL,
            ended_at            TEXT,
            duration_seconds    REAL,
            total_interactions  INTEGER
        );

        CREATE TABLE IF NOT EXISTS sensor_events (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id  TEXT NOT NULL,
            totem_id    TEXT NOT NULL,
            event_type  TEXT NOT NULL CHECK(event_type IN ('touch','presence','ldr')),
            value       REAL NOT NULL,
            duration    REAL,
            touch_type  TEXT CHECK(touch_type IS NULL OR touch_type IN ('short','long','none')),
            timestamp   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS session_aggregates (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id         TEXT NOT NULL UNIQUE
                               REFERENCES sessions(session_id) ON DELETE CASCADE,
            totem_id           TEXT NOT NULL,
            total_touches      INTEGER NOT NULL DEFAULT 0,
            short_touches      INTEGER NOT NULL DEFAULT 0,
            long_touches       INTEGER NOT NULL DEFAULT 0,
            avg_presence_time  REAL NOT NULL DEFAULT 0,
            avg_light_level    REAL NOT NULL DEFAULT 0,
            session_duration   REAL NOT NULL DEFAULT 0,
            interaction_score  REAL NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_events_session ON sensor_events(session_id);
        CREATE INDEX IF NOT EXISTS idx_events_timestamp ON sensor_events(timestamp);
        CREATE INDEX IF NOT EXISTS idx_events_dedup
            ON sensor_events(session_id, event_type, timestamp);
        CREATE INDEX IF NOT EXISTS idx_sessions_totem ON sessions(totem_id);

        COMMIT;
        "#,
    )?;
    Ok(())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> AppResult<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (strftime('%Y-%m-%dT%H:%M:%fZ','now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    // 1) Ensure log table
    ensure_log_table(conn)?;

    // 2) Refuse stores written by a newer build
    let version = schema_version(conn)?;
    if version > CURRENT_SCHEMA_VERSION {
        return Err(AppError::Migration(format!(
            "database version ({}) is newer than supported schema ({})",
            version, CURRENT_SCHEMA_VERSION
        )));
    }

    // 3) Version 1: core tables
    if version < 1 {
        let fresh = !table_exists(conn, "sensor_events")?;

        create_core_tables(conn)?;
        mark_applied(conn, CORE_SCHEMA_VERSION, "Created totem analytics tables")?;
        conn.pragma_update(None, "user_version", 1)?;

        if fresh {
            log::info!("created totem analytics tables (schema v1)");
        }
    }

    Ok(())
}
