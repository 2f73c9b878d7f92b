use chrono::{DateTime, Utc};
use serde::Serialize;

/// One bounded interaction window on a totem.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: i64,
    pub session_id: String,
    pub totem_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub total_interactions: Option<i64>,
}

impl Session {
    pub fn is_closed(&self) -> bool {
        self.ended_at.is_some()
    }
}
