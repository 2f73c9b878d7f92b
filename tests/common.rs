#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, Duration, Timelike, Utc};
use std::env;
use std::fs;
use std::path::PathBuf;
use totemlog::db::pool::DbPool;
use totemlog::models::raw_event::{
    LightReading, PresenceReading, RawEvent, SessionEndMarker, TouchReading,
};
use totemlog::models::touch_type::TouchType;

pub const TOTEM: &str = "TOTEM-TEST";

pub fn cli() -> Command {
    cargo_bin_cmd!("totemlog")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_totemlog.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_totemlog_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Fresh store file with the schema applied.
pub fn open_pool(name: &str) -> DbPool {
    DbPool::new(&setup_test_db(name)).expect("open test db")
}

pub fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("valid rfc3339")
        .with_timezone(&Utc)
}

/// A recent whole-second instant, inside the default analysis window.
pub fn hours_ago(h: i64) -> DateTime<Utc> {
    let now = Utc::now() - Duration::hours(h);
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn touch(session: &str, at: DateTime<Utc>, duration: Option<f64>) -> RawEvent {
    let (value, touch_type) = match duration {
        Some(d) => (1.0, TouchType::from_duration(d)),
        None => (0.0, TouchType::None),
    };
    RawEvent::Touch(TouchReading {
        session_id: session.to_string(),
        totem_id: TOTEM.to_string(),
        timestamp: at,
        value,
        duration,
        touch_type,
    })
}

pub fn presence(session: &str, at: DateTime<Utc>, value: f64) -> RawEvent {
    RawEvent::Presence(PresenceReading {
        session_id: session.to_string(),
        totem_id: TOTEM.to_string(),
        timestamp: at,
        value,
    })
}

pub fn ldr(session: &str, at: DateTime<Utc>, value: f64) -> RawEvent {
    RawEvent::Ldr(LightReading {
        session_id: session.to_string(),
        totem_id: TOTEM.to_string(),
        timestamp: at,
        value,
    })
}

pub fn session_end(session: &str, duration: f64, ended_at: DateTime<Utc>) -> RawEvent {
    RawEvent::SessionEnd(SessionEndMarker {
        session_id: session.to_string(),
        duration,
        ended_at,
    })
}

/// Raw insert bypassing the collector (for dirty fixtures).
pub fn insert_row(pool: &DbPool, session: &str, kind: &str, value: f64, timestamp: &str) -> i64 {
    pool.conn
        .execute(
            "INSERT INTO sensor_events (session_id, totem_id, event_type, value, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![session, TOTEM, kind, value, timestamp],
        )
        .expect("insert row");
    pool.conn.last_insert_rowid()
}

/// Session row with an explicit start.
pub fn insert_session(pool: &DbPool, session: &str, started_at: &str) {
    pool.conn
        .execute(
            "INSERT INTO sessions (session_id, totem_id, started_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![session, TOTEM, started_at],
        )
        .expect("insert session");
}

pub fn values_of(pool: &DbPool, kind: &str) -> Vec<f64> {
    let mut stmt = pool
        .conn
        .prepare("SELECT value FROM sensor_events WHERE event_type = ?1 ORDER BY id")
        .expect("prepare");
    stmt.query_map([kind], |row| row.get(0))
        .expect("query")
        .map(|r| r.expect("row"))
        .collect()
}
