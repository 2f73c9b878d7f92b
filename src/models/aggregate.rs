use serde::Serialize;

/// Upper bound of the interaction score.
pub const MAX_INTERACTION_SCORE: f64 = 100.0;

/// Per-session rollup, written once when the session closes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionAggregate {
    pub session_id: String,
    pub totem_id: String,
    pub total_touches: i64,
    pub short_touches: i64,
    pub long_touches: i64,
    /// Number of active presence readings, not seconds.
    pub avg_presence_time: f64,
    pub avg_light_level: f64,
    /// Sum of active touch durations (not the wall-clock session length).
    pub session_duration: f64,
    pub interaction_score: f64,
}
