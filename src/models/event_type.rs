use serde::{Deserialize, Serialize};

/// Kind of sensor that produced an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Touch,
    Presence,
    Ldr,
}

impl EventType {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EventType::Touch => "touch",
            EventType::Presence => "presence",
            EventType::Ldr => "ldr",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "touch" => Some(EventType::Touch),
            "presence" => Some(EventType::Presence),
            "ldr" => Some(EventType::Ldr),
            _ => None,
        }
    }
}

/// Light sensor (LDR) ADC bounds.
pub const LDR_MIN: f64 = 0.0;
pub const LDR_MAX: f64 = 1023.0;
/// Replacement for out-of-range light readings.
pub const LDR_MIDPOINT: f64 = 512.0;
