use crate::errors::{AppError, AppResult};
use crate::models::aggregate::SessionAggregate;
use crate::models::event::SensorEvent;
use crate::models::event_type::EventType;
use crate::models::raw_event::RawEvent;
use crate::models::session::Session;
use crate::models::totem::TotemSummary;
use crate::models::touch_type::TouchType;
use crate::utils::time::{parse_timestamp, to_canonical};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

const EVENT_COLUMNS: &str =
    "id, session_id, totem_id, event_type, value, duration, touch_type, timestamp";

fn conversion_error(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn timestamp_column(row: &Row, name: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.get(name)?;
    parse_timestamp(&raw).ok_or_else(|| {
        let idx = row.as_ref().column_index(name).unwrap_or(0);
        conversion_error(idx, AppError::InvalidTimestamp(raw))
    })
}

fn optional_timestamp_column(row: &Row, name: &str) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(name)?;
    match raw {
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| conversion_error(0, AppError::InvalidTimestamp(s))),
        None => Ok(None),
    }
}

pub fn map_event_row(row: &Row) -> Result<SensorEvent> {
    let kind_str: String = row.get("event_type")?;
    let event_type = EventType::from_db_str(&kind_str)
        .ok_or_else(|| conversion_error(3, AppError::InvalidEventType(kind_str.clone())))?;

    let touch_type = row
        .get::<_, Option<String>>("touch_type")?
        .and_then(|s| TouchType::from_db_str(&s));

    Ok(SensorEvent {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        totem_id: row.get("totem_id")?,
        event_type,
        value: row.get("value")?,
        duration: row.get("duration")?,
        touch_type,
        timestamp: timestamp_column(row, "timestamp")?,
    })
}

/// Like [`map_event_row`], but a row whose timestamp does not parse is
/// logged and mapped to `None` so one bad row cannot fail a whole scan.
pub fn map_event_row_lenient(row: &Row) -> Result<Option<SensorEvent>> {
    let raw: String = row.get("timestamp")?;
    if parse_timestamp(&raw).is_none() {
        let id: i64 = row.get("id")?;
        log::warn!("event {id}: unparseable timestamp '{raw}', skipped");
        return Ok(None);
    }
    map_event_row(row).map(Some)
}

pub fn map_session_row(row: &Row) -> Result<Session> {
    Ok(Session {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        totem_id: row.get("totem_id")?,
        started_at: timestamp_column(row, "started_at")?,
        ended_at: optional_timestamp_column(row, "ended_at")?,
        duration_seconds: row.get("duration_seconds")?,
        total_interactions: row.get("total_interactions")?,
    })
}

fn map_aggregate_row(row: &Row) -> Result<SessionAggregate> {
    Ok(SessionAggregate {
        session_id: row.get("session_id")?,
        totem_id: row.get("totem_id")?,
        total_touches: row.get("total_touches")?,
        short_touches: row.get("short_touches")?,
        long_touches: row.get("long_touches")?,
        avg_presence_time: row.get("avg_presence_time")?,
        avg_light_level: row.get("avg_light_level")?,
        session_duration: row.get("session_duration")?,
        interaction_score: row.get("interaction_score")?,
    })
}

/// Insert one raw reading. The session-end marker is not an event.
pub fn insert_event(conn: &Connection, ev: &RawEvent) -> AppResult<i64> {
    let (session_id, totem_id, kind, value, duration, touch_type, ts) = match ev {
        RawEvent::Touch(t) => (
            &t.session_id,
            &t.totem_id,
            EventType::Touch,
            t.value,
            t.duration,
            Some(t.touch_type.to_db_str()),
            &t.timestamp,
        ),
        RawEvent::Presence(p) => (
            &p.session_id,
            &p.totem_id,
            EventType::Presence,
            p.value,
            None,
            None,
            &p.timestamp,
        ),
        RawEvent::Ldr(l) => (
            &l.session_id,
            &l.totem_id,
            EventType::Ldr,
            l.value,
            None,
            None,
            &l.timestamp,
        ),
        RawEvent::SessionEnd(_) => {
            return Err(AppError::InvalidEventType("session_end".into()));
        }
    };

    conn.execute(
        "INSERT INTO sensor_events (session_id, totem_id, event_type, value, duration, touch_type, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            session_id,
            totem_id,
            kind.to_db_str(),
            value,
            duration,
            touch_type,
            to_canonical(ts),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Create the totem row on first sight. Returns `true` when it was created.
pub fn ensure_totem(conn: &Connection, totem_id: &str, location: &str) -> AppResult<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO totems (totem_id, location, status) VALUES (?1, ?2, 'active')",
        params![totem_id, location],
    )?;
    Ok(inserted > 0)
}

pub fn create_session(
    conn: &Connection,
    session_id: &str,
    totem_id: &str,
    started_at: &DateTime<Utc>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO sessions (session_id, totem_id, started_at) VALUES (?1, ?2, ?3)",
        params![session_id, totem_id, to_canonical(started_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Close a session. A session closes exactly once: closing an unknown or
/// already closed session is an error.
pub fn end_session(
    conn: &Connection,
    session_id: &str,
    ended_at: &DateTime<Utc>,
    duration_seconds: f64,
    total_interactions: i64,
) -> AppResult<()> {
    let updated = conn.execute(
        "UPDATE sessions
         SET ended_at = ?1,
             duration_seconds = ?2,
             total_interactions = ?3
         WHERE session_id = ?4 AND ended_at IS NULL",
        params![
            to_canonical(ended_at),
            duration_seconds,
            total_interactions,
            session_id
        ],
    )?;

    if updated == 0 {
        return Err(AppError::Other(format!(
            "session {session_id} is unknown or already closed"
        )));
    }
    Ok(())
}

pub fn insert_session_aggregate(conn: &Connection, agg: &SessionAggregate) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO session_aggregates
            (session_id, totem_id, total_touches, short_touches, long_touches,
             avg_presence_time, avg_light_level, session_duration, interaction_score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            agg.session_id,
            agg.totem_id,
            agg.total_touches,
            agg.short_touches,
            agg.long_touches,
            agg.avg_presence_time,
            agg.avg_light_level,
            agg.session_duration,
            agg.interaction_score,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_session(conn: &Connection, session_id: &str) -> AppResult<Option<Session>> {
    let session = conn
        .query_row(
            "SELECT id, session_id, totem_id, started_at, ended_at, duration_seconds, total_interactions
             FROM sessions WHERE session_id = ?1",
            [session_id],
            map_session_row,
        )
        .optional()?;
    Ok(session)
}

pub fn load_aggregate(conn: &Connection, session_id: &str) -> AppResult<Option<SessionAggregate>> {
    let agg = conn
        .query_row(
            "SELECT * FROM session_aggregates WHERE session_id = ?1",
            [session_id],
            map_aggregate_row,
        )
        .optional()?;
    Ok(agg)
}

pub fn load_events_by_session(conn: &Connection, session_id: &str) -> AppResult<Vec<SensorEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM sensor_events
         WHERE session_id = ?1
         ORDER BY timestamp ASC, id ASC"
    ))?;

    let rows = stmt.query_map([session_id], map_event_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// All events, optionally restricted to `[start, end)` (canonical text bounds).
/// Rows with an unparseable timestamp are skipped.
pub fn load_events_between(
    conn: &Connection,
    bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> AppResult<Vec<SensorEvent>> {
    let mut out = Vec::new();

    match bounds {
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM sensor_events ORDER BY timestamp ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], map_event_row_lenient)?;
            for r in rows {
                out.extend(r?);
            }
        }
        Some((start, end)) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM sensor_events
                 WHERE timestamp >= ?1 AND timestamp < ?2
                 ORDER BY timestamp ASC, id ASC"
            ))?;
            let rows = stmt.query_map(
                params![to_canonical(&start), to_canonical(&end)],
                map_event_row_lenient,
            )?;
            for r in rows {
                out.extend(r?);
            }
        }
    }

    Ok(out)
}

pub fn count_events(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM sensor_events", [], |row| row.get(0))?)
}

/// Sessions, touches and scores per totem (totems with no sessions included).
pub fn totem_summaries(conn: &Connection) -> AppResult<Vec<TotemSummary>> {
    let mut stmt = conn.prepare(
        "SELECT t.totem_id,
                t.location,
                COUNT(DISTINCT s.session_id)       AS total_sessions,
                COALESCE(SUM(sa.total_touches), 0) AS total_touches,
                AVG(sa.interaction_score)          AS avg_interaction_score,
                AVG(s.duration_seconds)            AS avg_session_duration
         FROM totems t
         LEFT JOIN sessions s ON t.totem_id = s.totem_id
         LEFT JOIN session_aggregates sa ON s.session_id = sa.session_id
         GROUP BY t.totem_id, t.location
         ORDER BY t.totem_id ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(TotemSummary {
            totem_id: row.get("totem_id")?,
            location: row.get("location")?,
            total_sessions: row.get("total_sessions")?,
            total_touches: row.get("total_touches")?,
            avg_interaction_score: row.get("avg_interaction_score")?,
            avg_session_duration: row.get("avg_session_duration")?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
