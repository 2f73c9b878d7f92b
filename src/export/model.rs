use crate::models::event::SensorEvent;
use crate::utils::time::to_canonical;
use serde::Serialize;

/// Flat row for CSV / JSON export.
#[derive(Serialize, Clone, Debug)]
pub struct EventExport {
    pub id: i64,
    pub session_id: String,
    pub totem_id: String,
    pub event_type: String,
    pub value: f64,
    pub duration: Option<f64>,
    pub touch_type: Option<String>,
    pub timestamp: String,
}

impl From<&SensorEvent> for EventExport {
    fn from(e: &SensorEvent) -> Self {
        Self {
            id: e.id,
            session_id: e.session_id.clone(),
            totem_id: e.totem_id.clone(),
            event_type: e.event_type.to_db_str().to_string(),
            value: e.value,
            duration: e.duration,
            touch_type: e.touch_type.map(|t| t.to_db_str().to_string()),
            timestamp: to_canonical(&e.timestamp),
        }
    }
}
