//! Collector wire format: what a feed (simulator, JSON batch) hands to the
//! aggregator. One variant per sensor, each with only the fields it owns.

use super::touch_type::TouchType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TouchReading {
    pub session_id: String,
    pub totem_id: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub touch_type: TouchType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresenceReading {
    pub session_id: String,
    pub totem_id: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LightReading {
    pub session_id: String,
    pub totem_id: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Terminates a batch: consumed to close the session, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEndMarker {
    pub session_id: String,
    pub duration: f64,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RawEvent {
    Touch(TouchReading),
    Presence(PresenceReading),
    Ldr(LightReading),
    SessionEnd(SessionEndMarker),
}

impl RawEvent {
    pub fn session_id(&self) -> &str {
        match self {
            RawEvent::Touch(t) => &t.session_id,
            RawEvent::Presence(p) => &p.session_id,
            RawEvent::Ldr(l) => &l.session_id,
            RawEvent::SessionEnd(m) => &m.session_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            RawEvent::Touch(t) => t.timestamp,
            RawEvent::Presence(p) => p.timestamp,
            RawEvent::Ldr(l) => l.timestamp,
            RawEvent::SessionEnd(m) => m.ended_at,
        }
    }

    pub fn is_session_end(&self) -> bool {
        matches!(self, RawEvent::SessionEnd(_))
    }

    pub fn active_touch(&self) -> Option<&TouchReading> {
        match self {
            RawEvent::Touch(t) if t.value == 1.0 => Some(t),
            _ => None,
        }
    }
}
