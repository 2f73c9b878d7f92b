use super::{event_type::EventType, touch_type::TouchType};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A persisted sensor observation.
#[derive(Debug, Clone, Serialize)]
pub struct SensorEvent {
    pub id: i64,
    pub session_id: String,            // ⇔ sensor_events.session_id
    pub totem_id: String,              // ⇔ sensor_events.totem_id
    pub event_type: EventType,         // ⇔ sensor_events.event_type ('touch' | 'presence' | 'ldr')
    pub value: f64,                    // ⇔ sensor_events.value (0/1 or 0..=1023)
    pub duration: Option<f64>,         // ⇔ sensor_events.duration (touch only)
    pub touch_type: Option<TouchType>, // ⇔ sensor_events.touch_type
    pub timestamp: DateTime<Utc>,      // ⇔ sensor_events.timestamp (canonical UTC text)
}

impl SensorEvent {
    /// Binary sensors fired (value = 1).
    pub fn is_active(&self) -> bool {
        self.value == 1.0
    }

    pub fn is_active_touch(&self) -> bool {
        self.event_type == EventType::Touch && self.is_active()
    }
}
