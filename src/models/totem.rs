use serde::Serialize;

/// Per-totem rollup used by the `stats` command.
#[derive(Debug, Clone, Serialize)]
pub struct TotemSummary {
    pub totem_id: String,
    pub location: String,
    pub total_sessions: i64,
    pub total_touches: i64,
    pub avg_interaction_score: Option<f64>,
    pub avg_session_duration: Option<f64>,
}
