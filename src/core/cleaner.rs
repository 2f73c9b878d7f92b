//! Data-quality maintenance over the event store: deduplication, value
//! validation with in-place repair, UTC normalization and retention.
//!
//! At most one cleaner pass per store is expected to run at a time; the
//! multi-statement writes below take no application-level lock.

use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::event_type::{LDR_MAX, LDR_MIDPOINT, LDR_MIN};
use crate::utils::stats::round2;
use crate::utils::time::{parse_timestamp, to_canonical};
use chrono::{Duration, Utc};
use rusqlite::params;
use serde::Serialize;
use std::collections::BTreeMap;

/// Same predicate used for detection and for the quality report.
const INVALID_VALUE_PREDICATE: &str = "(event_type IN ('touch', 'presence') AND value NOT IN (0, 1))
     OR (event_type = 'ldr' AND (value < 0 OR value > 1023))";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Touch/presence value outside {0, 1}.
    InvalidValue,
    /// Light reading outside [0, 1023].
    InvalidLdr,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub id: i64,
    pub kind: ViolationKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationOutcome {
    pub count: usize,
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    pub duplicates_removed: usize,
    pub invalid_records_fixed: usize,
    pub timestamps_standardized: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub total_records: i64,
    pub records_by_type: BTreeMap<String, i64>,
    pub complete_sessions: i64,
    pub records_with_problems: i64,
    pub quality_score: f64,
}

/// `round2((1 - problems/total) * 100)`, 100 for an empty store.
pub fn quality_score(total: i64, problems: i64) -> f64 {
    if total <= 0 {
        return 100.0;
    }
    let ratio = problems.clamp(0, total) as f64 / total as f64;
    round2((1.0 - ratio) * 100.0)
}

pub struct DataCleaner<'a> {
    pool: &'a mut DbPool,
}

impl<'a> DataCleaner<'a> {
    pub fn new(pool: &'a mut DbPool) -> Self {
        Self { pool }
    }

    /// Among events sharing (session_id, event_type, timestamp) keep the
    /// lowest id. Returns the number of rows deleted.
    pub fn remove_duplicates(&mut self) -> AppResult<usize> {
        let removed = self.pool.with_transaction(|tx| {
            Ok(tx.execute(
                "DELETE FROM sensor_events
                 WHERE id IN (
                     SELECT id
                     FROM (
                         SELECT id,
                                ROW_NUMBER() OVER (
                                    PARTITION BY session_id, event_type, timestamp
                                    ORDER BY id
                                ) AS rn
                         FROM sensor_events
                     ) t
                     WHERE t.rn > 1
                 )",
                [],
            )?)
        })?;

        log::debug!("remove_duplicates: {removed} rows deleted");
        Ok(removed)
    }

    /// Detect out-of-domain values, then repair them in place:
    /// touch/presence → 0, ldr → 512.
    pub fn validate_sensor_values(&mut self) -> AppResult<ValidationOutcome> {
        let issues = self.pool.with_transaction(|tx| {
            let mut issues = Vec::new();

            {
                let mut stmt = tx.prepare(
                    "SELECT id, event_type, value
                     FROM sensor_events
                     WHERE event_type IN ('touch', 'presence')
                       AND value NOT IN (0, 1)
                     ORDER BY id",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                    ))
                })?;
                for r in rows {
                    let (id, kind, value) = r?;
                    issues.push(ValidationIssue {
                        id,
                        kind: ViolationKind::InvalidValue,
                        message: format!("{kind} event with invalid value: {value}"),
                    });
                }
            }

            {
                let mut stmt = tx.prepare(
                    "SELECT id, value
                     FROM sensor_events
                     WHERE event_type = 'ldr'
                       AND (value < ?1 OR value > ?2)
                     ORDER BY id",
                )?;
                let rows = stmt.query_map(params![LDR_MIN, LDR_MAX], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
                })?;
                for r in rows {
                    let (id, value) = r?;
                    issues.push(ValidationIssue {
                        id,
                        kind: ViolationKind::InvalidLdr,
                        message: format!("LDR value out of range (0-1023): {value}"),
                    });
                }
            }

            for issue in &issues {
                let replacement = match issue.kind {
                    ViolationKind::InvalidValue => 0.0,
                    ViolationKind::InvalidLdr => LDR_MIDPOINT,
                };
                tx.execute(
                    "UPDATE sensor_events SET value = ?1 WHERE id = ?2",
                    params![replacement, issue.id],
                )?;
            }

            Ok(issues)
        })?;

        for issue in &issues {
            log::info!("repaired event {}: {}", issue.id, issue.message);
        }

        Ok(ValidationOutcome {
            count: issues.len(),
            issues,
        })
    }

    /// Rewrite every parseable timestamp into canonical UTC text.
    /// Returns the number of rows actually rewritten; a second pass is a no-op.
    pub fn standardize_timestamps(&mut self) -> AppResult<usize> {
        self.pool.with_transaction(|tx| {
            let rows: Vec<(i64, String)> = {
                let mut stmt = tx
                    .prepare("SELECT id, timestamp FROM sensor_events WHERE timestamp IS NOT NULL")?;
                let mapped = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

                let mut v = Vec::new();
                for r in mapped {
                    v.push(r?);
                }
                v
            };

            let mut touched = 0;
            for (id, raw) in rows {
                let Some(parsed) = parse_timestamp(&raw) else {
                    log::warn!("event {id}: unparseable timestamp '{raw}' left untouched");
                    continue;
                };

                let canonical = to_canonical(&parsed);
                if canonical != raw {
                    tx.execute(
                        "UPDATE sensor_events SET timestamp = ?1 WHERE id = ?2",
                        params![canonical, id],
                    )?;
                    touched += 1;
                }
            }

            Ok(touched)
        })
    }

    /// Retention: drop events older than `retention_days`, then sessions
    /// started before the cutoff that no longer own any event (their
    /// aggregates cascade). Returns events + sessions deleted.
    pub fn remove_old_data(&mut self, retention_days: i64) -> AppResult<usize> {
        let cutoff = to_canonical(&(Utc::now() - Duration::days(retention_days)));

        let (events, sessions) = self.pool.with_transaction(|tx| {
            // Events first, so the "has events" check below sees survivors only.
            let events = tx.execute("DELETE FROM sensor_events WHERE timestamp < ?1", [&cutoff])?;

            let sessions = tx.execute(
                "DELETE FROM sessions
                 WHERE started_at < ?1
                   AND session_id NOT IN (SELECT DISTINCT session_id FROM sensor_events)",
                [&cutoff],
            )?;

            Ok((events, sessions))
        })?;

        log::info!("retention ({retention_days} days): {events} events, {sessions} sessions deleted");
        Ok(events + sessions)
    }

    /// Dedup → validate/repair → standardize. A failing step is logged and
    /// counted as 0; the following steps still run.
    pub fn clean_all(&mut self) -> CleanSummary {
        let duplicates_removed = self.remove_duplicates().unwrap_or_else(|e| {
            log::error!("remove_duplicates failed: {e}");
            0
        });

        let invalid_records_fixed = match self.validate_sensor_values() {
            Ok(outcome) => outcome.count,
            Err(e) => {
                log::error!("validate_sensor_values failed: {e}");
                0
            }
        };

        let timestamps_standardized = self.standardize_timestamps().unwrap_or_else(|e| {
            log::error!("standardize_timestamps failed: {e}");
            0
        });

        CleanSummary {
            duplicates_removed,
            invalid_records_fixed,
            timestamps_standardized,
        }
    }

    pub fn get_data_quality_report(&mut self) -> AppResult<QualityReport> {
        let conn = &self.pool.conn;

        let total_records: i64 =
            conn.query_row("SELECT COUNT(*) FROM sensor_events", [], |row| row.get(0))?;

        let mut records_by_type = BTreeMap::new();
        {
            let mut stmt = conn.prepare(
                "SELECT event_type, COUNT(*) FROM sensor_events GROUP BY event_type",
            )?;
            let rows =
                stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            for r in rows {
                let (kind, count) = r?;
                records_by_type.insert(kind, count);
            }
        }

        let complete_sessions: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE ended_at IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let records_with_problems: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM sensor_events WHERE {INVALID_VALUE_PREDICATE}"),
            [],
            |row| row.get(0),
        )?;

        Ok(QualityReport {
            total_records,
            records_by_type,
            complete_sessions,
            records_with_problems,
            quality_score: quality_score(total_records, records_with_problems),
        })
    }
}
