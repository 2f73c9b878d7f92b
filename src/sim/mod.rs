//! Sensor feed abstraction and a random simulator implementing it.

use crate::models::raw_event::{
    LightReading, PresenceReading, RawEvent, SessionEndMarker, TouchReading,
};
use crate::models::touch_type::TouchType;
use crate::utils::stats::round2;
use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

const PRESENCE_PROBABILITY: f64 = 0.6;
const TOUCH_PROBABILITY: f64 = 0.3;
/// Daylight hours (UTC, inclusive) get brighter light readings.
const DAYLIGHT_HOURS: std::ops::RangeInclusive<u32> = 8..=18;

/// Anything that produces raw events for one session at a time.
pub trait SensorFeed {
    fn totem_id(&self) -> &str;

    /// Open a new session; returns its id and start instant.
    fn start_session(&mut self) -> (String, DateTime<Utc>);

    /// Readings for the open session, terminated by a `SessionEnd` marker.
    fn interaction_cycle(&mut self, duration_seconds: u32) -> Vec<RawEvent>;
}

pub struct SensorSimulator {
    totem_id: String,
    rng: StdRng,
    session: Option<(String, DateTime<Utc>)>,
}

impl SensorSimulator {
    /// `seed = None` draws from OS entropy.
    pub fn new(totem_id: &str, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            totem_id: totem_id.to_string(),
            rng,
            session: None,
        }
    }

    fn presence(&mut self, session_id: &str, at: DateTime<Utc>) -> PresenceReading {
        let detected = self.rng.r#gen::<f64>() < PRESENCE_PROBABILITY;
        PresenceReading {
            session_id: session_id.to_string(),
            totem_id: self.totem_id.clone(),
            timestamp: at,
            value: if detected { 1.0 } else { 0.0 },
        }
    }

    fn touch(&mut self, session_id: &str, at: DateTime<Utc>) -> TouchReading {
        let detected = self.rng.r#gen::<f64>() < TOUCH_PROBABILITY;
        let (value, duration, touch_type) = if detected {
            let secs = self.rng.gen_range(0.1..2.0);
            (1.0, Some(round2(secs)), TouchType::from_duration(secs))
        } else {
            (0.0, None, TouchType::None)
        };

        TouchReading {
            session_id: session_id.to_string(),
            totem_id: self.totem_id.clone(),
            timestamp: at,
            value,
            duration,
            touch_type,
        }
    }

    fn light(&mut self, session_id: &str, at: DateTime<Utc>) -> LightReading {
        let value = if DAYLIGHT_HOURS.contains(&at.hour()) {
            self.rng.gen_range(600..=1023)
        } else {
            self.rng.gen_range(100..=400)
        };
        LightReading {
            session_id: session_id.to_string(),
            totem_id: self.totem_id.clone(),
            timestamp: at,
            value: value as f64,
        }
    }

    /// One tick: presence, a touch only when someone is present, light.
    fn tick(&mut self, session_id: &str, at: DateTime<Utc>) -> Vec<RawEvent> {
        let mut out = Vec::with_capacity(3);

        let presence = self.presence(session_id, at);
        let present = presence.value == 1.0;
        out.push(RawEvent::Presence(presence));

        if present {
            out.push(RawEvent::Touch(self.touch(session_id, at)));
        }

        out.push(RawEvent::Ldr(self.light(session_id, at)));
        out
    }
}

impl SensorFeed for SensorSimulator {
    fn totem_id(&self) -> &str {
        &self.totem_id
    }

    fn start_session(&mut self) -> (String, DateTime<Utc>) {
        let now = Utc::now();
        let started_at = now.duration_trunc(Duration::seconds(1)).unwrap_or(now);
        let session_id = Uuid::new_v4().to_string();

        self.session = Some((session_id.clone(), started_at));
        (session_id, started_at)
    }

    /// Fast mode: one tick per simulated second, no sleeping.
    fn interaction_cycle(&mut self, duration_seconds: u32) -> Vec<RawEvent> {
        let (session_id, started_at) = match self.session.take() {
            Some(s) => s,
            None => self.start_session(),
        };
        self.session = None;

        let mut events = Vec::new();
        for second in 0..duration_seconds {
            let at = started_at + Duration::seconds(i64::from(second));
            events.extend(self.tick(&session_id, at));
        }

        events.push(RawEvent::SessionEnd(SessionEndMarker {
            session_id,
            duration: f64::from(duration_seconds),
            ended_at: started_at + Duration::seconds(i64::from(duration_seconds)),
        }));

        events
    }
}
