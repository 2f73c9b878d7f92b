use crate::models::aggregate::{MAX_INTERACTION_SCORE, SessionAggregate};
use crate::models::raw_event::RawEvent;
use crate::models::touch_type::TouchType;
use crate::utils::stats::{mean, round2};

const POINTS_PER_TOUCH: f64 = 10.0;
const MAX_TOUCH_POINTS: f64 = 50.0;
const POINTS_PER_TOUCH_SECOND: f64 = 5.0;
const MAX_DURATION_POINTS: f64 = 30.0;
const POINTS_PER_LONG_TOUCH: f64 = 5.0;

/// `clamp(min(touches*10, 50) + min(duration*5, 30) + long*5, 0, 100)`.
///
/// The long-touch term is uncapped on its own; only the final clamp bounds it.
pub fn interaction_score(total_touches: i64, touch_seconds: f64, long_touches: i64) -> f64 {
    let base = (total_touches as f64 * POINTS_PER_TOUCH).min(MAX_TOUCH_POINTS);
    let duration = (touch_seconds * POINTS_PER_TOUCH_SECOND).min(MAX_DURATION_POINTS);
    let kind = long_touches as f64 * POINTS_PER_LONG_TOUCH;

    (base + duration + kind).clamp(0.0, MAX_INTERACTION_SCORE)
}

/// Derive the aggregate of one session from its raw batch.
/// Session-end markers are ignored.
pub fn compute_aggregate(session_id: &str, totem_id: &str, events: &[RawEvent]) -> SessionAggregate {
    let mut total_touches = 0i64;
    let mut short_touches = 0i64;
    let mut long_touches = 0i64;
    let mut touch_seconds = 0.0;
    let mut presence_ticks = 0i64;
    let mut light = Vec::new();

    for ev in events {
        match ev {
            RawEvent::Touch(t) if t.value == 1.0 => {
                total_touches += 1;
                match t.touch_type {
                    TouchType::Short => short_touches += 1,
                    TouchType::Long => long_touches += 1,
                    TouchType::None => {}
                }
                touch_seconds += t.duration.unwrap_or(0.0);
            }
            RawEvent::Presence(p) if p.value == 1.0 => presence_ticks += 1,
            RawEvent::Ldr(l) => light.push(l.value),
            _ => {}
        }
    }

    let score = interaction_score(total_touches, touch_seconds, long_touches);

    SessionAggregate {
        session_id: session_id.to_string(),
        totem_id: totem_id.to_string(),
        total_touches,
        short_touches,
        long_touches,
        // A count of "present" ticks, kept under its historical name.
        avg_presence_time: round2(presence_ticks as f64),
        avg_light_level: round2(mean(&light).unwrap_or(0.0)),
        session_duration: round2(touch_seconds),
        interaction_score: round2(score),
    }
}
