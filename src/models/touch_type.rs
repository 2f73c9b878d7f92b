use serde::{Deserialize, Serialize};

/// Classification of a touch by its duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TouchType {
    Short,
    Long,
    #[default]
    None,
}

/// Touches strictly longer than this many seconds are `long`.
pub const LONG_TOUCH_THRESHOLD_SECS: f64 = 1.0;

impl TouchType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TouchType::Short => "short",
            TouchType::Long => "long",
            TouchType::None => "none",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "short" => Some(TouchType::Short),
            "long" => Some(TouchType::Long),
            "none" => Some(TouchType::None),
            _ => None,
        }
    }

    pub fn from_duration(duration: f64) -> Self {
        if duration > LONG_TOUCH_THRESHOLD_SECS {
            TouchType::Long
        } else {
            TouchType::Short
        }
    }
}
