//! Read-only reports over a time window of events joined with their sessions.
//!
//! Every analysis takes the loaded window as a slice and returns a
//! serializable value. Empty inputs serialize as `{}`, matching the shape the
//! dashboard consumers expect.

use crate::db::pool::DbPool;
use crate::db::queries::map_event_row_lenient;
use crate::errors::AppResult;
use crate::models::event::SensorEvent;
use crate::models::event_type::EventType;
use crate::utils::stats::{max, mean, median, min, percentile, round2, sample_std};
use crate::utils::time::{parse_timestamp, to_canonical};
use chrono::{DateTime, Duration, Timelike, Utc};
use rusqlite::params;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Touch count at or above which a session counts as highly engaged.
pub const HIGH_ENGAGEMENT_TOUCHES: usize = 5;
/// Touch count below which a session counts as weakly engaged.
pub const LOW_ENGAGEMENT_TOUCHES: usize = 2;

/// An event with the start and wall-clock length of its session.
#[derive(Debug, Clone)]
pub struct AnalyzedEvent {
    pub event: SensorEvent,
    pub session_started: DateTime<Utc>,
    pub session_duration: Option<f64>,
}

// ---------------------------
// Descriptive statistics
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinarySensorStats {
    pub total_events: usize,
    pub active_count: usize,
    pub inactive_count: usize,
    pub activation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightStats {
    pub total_events: usize,
    pub mean: f64,
    pub median: f64,
    /// `None` below two readings.
    pub std: Option<f64>,
    pub min: i64,
    pub max: i64,
    pub q25: f64,
    pub q75: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub total_sessions: usize,
    pub avg_duration: f64,
    pub total_duration: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DescriptiveStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub touch: Option<BinarySensorStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<BinarySensorStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldr: Option<LightStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<SessionStats>,
}

// ---------------------------
// Touch patterns
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TouchSummary {
    pub total_touches: usize,
    pub touch_types: BTreeMap<String, usize>,
    pub avg_duration: f64,
    pub median_duration: f64,
    pub max_duration: f64,
    pub min_duration: f64,
}

/// The two empty states are distinct: no touch readings at all (`{}`)
/// versus readings of which none were active (`{"total_touches": 0}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TouchPatterns {
    NoTouchEvents {},
    NoActiveTouches { total_touches: usize },
    Summary(TouchSummary),
}

// ---------------------------
// Temporal patterns
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalSummary {
    /// Hour of day (UTC) → events.
    pub hourly_distribution: BTreeMap<u32, usize>,
    /// Weekday name → events.
    pub daily_distribution: BTreeMap<String, usize>,
    pub peak_hour: u32,
    pub peak_hour_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TemporalPatterns {
    Empty {},
    Summary(TemporalSummary),
}

// ---------------------------
// Engagement
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEngagement {
    pub session_id: String,
    pub touch_count: usize,
    pub presence_time: usize,
    pub avg_light: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementSummary {
    pub avg_touches_per_session: f64,
    pub avg_presence_time: f64,
    pub avg_light_level: f64,
    pub high_engagement_sessions: usize,
    pub low_engagement_sessions: usize,
    /// Percentage of sessions with at least one active touch.
    pub engagement_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EngagementMetrics {
    Empty {},
    Summary(EngagementSummary),
}

// ---------------------------
// Full report
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPeriod {
    pub start: String,
    pub end: String,
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub descriptive_stats: DescriptiveStats,
    pub touch_patterns: TouchPatterns,
    pub temporal_patterns: TemporalPatterns,
    pub engagement_metrics: EngagementMetrics,
    pub data_period: DataPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FullReport {
    NoData { error: String },
    Complete(Box<AnalysisReport>),
}

impl FullReport {
    pub fn no_data() -> Self {
        FullReport::NoData {
            error: "no data".to_string(),
        }
    }
}

pub struct StatisticalAnalyzer<'a> {
    pool: &'a DbPool,
    window_days: i64,
}

impl<'a> StatisticalAnalyzer<'a> {
    pub fn new(pool: &'a DbPool, window_days: i64) -> Self {
        Self { pool, window_days }
    }

    /// Events of the last `days` days (optionally one totem), oldest first.
    /// A storage failure is logged and yields an empty window; rows with an
    /// unparseable timestamp are skipped.
    pub fn load_window(&self, totem_id: Option<&str>, days: i64) -> Vec<AnalyzedEvent> {
        match self.query_window(totem_id, days) {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("failed to load analysis window: {e}");
                Vec::new()
            }
        }
    }

    fn query_window(&self, totem_id: Option<&str>, days: i64) -> AppResult<Vec<AnalyzedEvent>> {
        let cutoff = to_canonical(&(Utc::now() - Duration::days(days)));

        let mut stmt = self.pool.conn.prepare(
            "SELECT se.id, se.session_id, se.totem_id, se.event_type, se.value,
                    se.duration, se.touch_type, se.timestamp,
                    s.started_at       AS session_started,
                    s.duration_seconds AS session_duration
             FROM sensor_events se
             JOIN sessions s ON se.session_id = s.session_id
             WHERE se.timestamp >= ?1
               AND (?2 IS NULL OR se.totem_id = ?2)
             ORDER BY se.timestamp ASC, se.id ASC",
        )?;

        let rows = stmt.query_map(params![cutoff, totem_id], |row| {
            let event = map_event_row_lenient(row)?;
            let started: String = row.get("session_started")?;
            Ok((event, started, row.get::<_, Option<f64>>("session_duration")?))
        })?;

        let mut out = Vec::new();
        for r in rows {
            let (event, started, session_duration) = r?;
            let Some(event) = event else {
                continue;
            };
            let Some(session_started) = parse_timestamp(&started) else {
                log::warn!("session {}: unparseable start '{started}'", event.session_id);
                continue;
            };
            out.push(AnalyzedEvent {
                event,
                session_started,
                session_duration,
            });
        }
        Ok(out)
    }

    /// Load the configured window and run every analysis over it.
    pub fn generate_full_report(&self, totem_id: Option<&str>) -> FullReport {
        let events = self.load_window(totem_id, self.window_days);
        build_report(&events)
    }
}

/// All analyses over an already loaded window.
pub fn build_report(events: &[AnalyzedEvent]) -> FullReport {
    let (Some(first), Some(last)) = (
        events.iter().map(|e| e.event.timestamp).min(),
        events.iter().map(|e| e.event.timestamp).max(),
    ) else {
        return FullReport::no_data();
    };

    FullReport::Complete(Box::new(AnalysisReport {
        descriptive_stats: descriptive_stats(events),
        touch_patterns: touch_patterns(events),
        temporal_patterns: temporal_patterns(events),
        engagement_metrics: engagement_metrics(events),
        data_period: DataPeriod {
            start: to_canonical(&first),
            end: to_canonical(&last),
            total_records: events.len(),
        },
    }))
}

fn values_of(events: &[AnalyzedEvent], kind: EventType) -> Vec<f64> {
    events
        .iter()
        .filter(|e| e.event.event_type == kind)
        .map(|e| e.event.value)
        .collect()
}

fn binary_stats(values: &[f64]) -> Option<BinarySensorStats> {
    let rate = mean(values)?;
    Some(BinarySensorStats {
        total_events: values.len(),
        active_count: values.iter().filter(|v| **v == 1.0).count(),
        inactive_count: values.iter().filter(|v| **v == 0.0).count(),
        activation_rate: round2(rate * 100.0),
    })
}

fn light_stats(values: &[f64]) -> Option<LightStats> {
    Some(LightStats {
        total_events: values.len(),
        mean: round2(mean(values)?),
        median: round2(median(values)?),
        std: sample_std(values).map(round2),
        min: min(values)?.trunc() as i64,
        max: max(values)?.trunc() as i64,
        q25: round2(percentile(values, 0.25)?),
        q75: round2(percentile(values, 0.75)?),
    })
}

/// First row of each session, in window order.
fn first_row_per_session(events: &[AnalyzedEvent]) -> Vec<&AnalyzedEvent> {
    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|e| seen.insert(e.event.session_id.as_str()))
        .collect()
}

pub fn descriptive_stats(events: &[AnalyzedEvent]) -> DescriptiveStats {
    if events.is_empty() {
        return DescriptiveStats::default();
    }

    let sessions = first_row_per_session(events);
    let durations: Vec<f64> = sessions.iter().filter_map(|e| e.session_duration).collect();

    DescriptiveStats {
        touch: binary_stats(&values_of(events, EventType::Touch)),
        presence: binary_stats(&values_of(events, EventType::Presence)),
        ldr: light_stats(&values_of(events, EventType::Ldr)),
        sessions: Some(SessionStats {
            total_sessions: sessions.len(),
            avg_duration: round2(mean(&durations).unwrap_or(0.0)),
            total_duration: round2(durations.iter().sum()),
        }),
    }
}

pub fn touch_patterns(events: &[AnalyzedEvent]) -> TouchPatterns {
    let touches: Vec<&SensorEvent> = events
        .iter()
        .map(|e| &e.event)
        .filter(|e| e.event_type == EventType::Touch)
        .collect();

    if touches.is_empty() {
        return TouchPatterns::NoTouchEvents {};
    }

    let active: Vec<&SensorEvent> = touches.into_iter().filter(|e| e.is_active()).collect();
    if active.is_empty() {
        return TouchPatterns::NoActiveTouches { total_touches: 0 };
    }

    let mut touch_types = BTreeMap::new();
    for t in active.iter().filter_map(|e| e.touch_type) {
        *touch_types.entry(t.to_db_str().to_string()).or_insert(0) += 1;
    }

    let durations: Vec<f64> = active.iter().filter_map(|e| e.duration).collect();
    let summarize = |v: Option<f64>| round2(v.unwrap_or(0.0));

    TouchPatterns::Summary(TouchSummary {
        total_touches: active.len(),
        touch_types,
        avg_duration: summarize(mean(&durations)),
        median_duration: summarize(median(&durations)),
        max_duration: summarize(max(&durations)),
        min_duration: summarize(min(&durations)),
    })
}

pub fn temporal_patterns(events: &[AnalyzedEvent]) -> TemporalPatterns {
    if events.is_empty() {
        return TemporalPatterns::Empty {};
    }

    let mut hourly: BTreeMap<u32, usize> = BTreeMap::new();
    let mut daily: BTreeMap<String, usize> = BTreeMap::new();

    for e in events {
        let ts = e.event.timestamp;
        *hourly.entry(ts.hour()).or_insert(0) += 1;
        *daily.entry(ts.format("%A").to_string()).or_insert(0) += 1;
    }

    // Ascending hours with a strict comparison: the lowest hour wins ties.
    let mut peak = (0u32, 0usize);
    for (&hour, &count) in &hourly {
        if count > peak.1 {
            peak = (hour, count);
        }
    }

    TemporalPatterns::Summary(TemporalSummary {
        hourly_distribution: hourly,
        daily_distribution: daily,
        peak_hour: peak.0,
        peak_hour_count: peak.1,
    })
}

/// Per-session rollup, ordered by session id.
pub fn session_engagement(events: &[AnalyzedEvent]) -> Vec<SessionEngagement> {
    let mut by_session: BTreeMap<&str, Vec<&SensorEvent>> = BTreeMap::new();
    for e in events {
        by_session
            .entry(e.event.session_id.as_str())
            .or_default()
            .push(&e.event);
    }

    by_session
        .into_iter()
        .map(|(session_id, rows)| {
            let light: Vec<f64> = rows
                .iter()
                .filter(|e| e.event_type == EventType::Ldr)
                .map(|e| e.value)
                .collect();

            SessionEngagement {
                session_id: session_id.to_string(),
                touch_count: rows.iter().filter(|e| e.is_active_touch()).count(),
                presence_time: rows
                    .iter()
                    .filter(|e| e.event_type == EventType::Presence && e.is_active())
                    .count(),
                avg_light: mean(&light).unwrap_or(0.0),
            }
        })
        .collect()
}

pub fn engagement_metrics(events: &[AnalyzedEvent]) -> EngagementMetrics {
    let sessions = session_engagement(events);
    if sessions.is_empty() {
        return EngagementMetrics::Empty {};
    }

    let n = sessions.len() as f64;
    let avg = |f: fn(&SessionEngagement) -> f64| {
        round2(sessions.iter().map(f).sum::<f64>() / n)
    };
    let engaged = sessions.iter().filter(|s| s.touch_count > 0).count();

    EngagementMetrics::Summary(EngagementSummary {
        avg_touches_per_session: avg(|s| s.touch_count as f64),
        avg_presence_time: avg(|s| s.presence_time as f64),
        avg_light_level: avg(|s| s.avg_light),
        high_engagement_sessions: sessions
            .iter()
            .filter(|s| s.touch_count >= HIGH_ENGAGEMENT_TOUCHES)
            .count(),
        low_engagement_sessions: sessions
            .iter()
            .filter(|s| s.touch_count < LOW_ENGAGEMENT_TOUCHES)
            .count(),
        engagement_rate: round2(engaged as f64 / n * 100.0),
    })
}
