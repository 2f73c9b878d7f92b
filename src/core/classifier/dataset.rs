//! Labeled feature table for the touch classifier.
//!
//! Real rows come from active touch events joined with their session and
//! aggregate. Synthetic rows fill in when the store holds too few of them.

use crate::errors::AppResult;
use crate::models::touch_type::TouchType;
use crate::utils::time::{parse_timestamp, seconds_between};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;

pub const N_FEATURES: usize = 5;
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "duration",
    "session_duration",
    "total_touches",
    "avg_light_level",
    "time_in_session",
];

/// Below this many real rows the synthetic set is appended.
pub const MIN_REAL_SAMPLES: usize = 20;
pub const SYNTHETIC_SAMPLES: usize = 100;

pub type FeatureRow = [f64; N_FEATURES];

pub const LABEL_SHORT: u8 = 0;
pub const LABEL_LONG: u8 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: FeatureRow,
    pub label: u8,
}

#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub samples: Vec<Sample>,
    pub real: usize,
    pub synthetic: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Completed active touches with every feature present.
pub fn load_real_samples(conn: &Connection) -> AppResult<Vec<Sample>> {
    let mut stmt = conn.prepare(
        "SELECT se.duration,
                se.touch_type,
                s.duration_seconds AS session_duration,
                sa.total_touches,
                sa.avg_light_level,
                se.timestamp,
                s.started_at
         FROM sensor_events se
         JOIN sessions s ON se.session_id = s.session_id
         LEFT JOIN session_aggregates sa ON s.session_id = sa.session_id
         WHERE se.event_type = 'touch'
           AND se.value = 1
           AND se.duration IS NOT NULL
           AND se.touch_type IN ('short', 'long')
         ORDER BY se.id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<f64>>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<f64>>(2)?,
            row.get::<_, Option<i64>>(3)?,
            row.get::<_, Option<f64>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut out = Vec::new();
    for r in rows {
        let (duration, kind, session_duration, total_touches, avg_light, ts, started) = r?;

        let time_in_session = match (parse_timestamp(&ts), parse_timestamp(&started)) {
            (Some(at), Some(start)) => Some(seconds_between(&start, &at)),
            _ => None,
        };

        // Rows missing any feature are dropped.
        let (Some(d), Some(sd), Some(tt), Some(al), Some(tis)) =
            (duration, session_duration, total_touches, avg_light, time_in_session)
        else {
            continue;
        };

        let label = match TouchType::from_db_str(&kind) {
            Some(TouchType::Long) => LABEL_LONG,
            _ => LABEL_SHORT,
        };

        out.push(Sample {
            features: [d, sd, tt as f64, al, tis],
            label,
        });
    }

    Ok(out)
}

/// Fair coin per sample: short touches last U[0.1, 1.0) s, long U[1.0, 2.0) s.
pub fn synthetic_samples(n: usize, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n)
        .map(|_| {
            let (duration, label) = if rng.r#gen::<f64>() < 0.5 {
                (rng.gen_range(0.1..1.0), LABEL_SHORT)
            } else {
                (rng.gen_range(1.0..2.0), LABEL_LONG)
            };

            Sample {
                features: [
                    duration,
                    rng.gen_range(10.0..120.0),
                    rng.gen_range(1..10) as f64,
                    rng.gen_range(300.0..800.0),
                    rng.gen_range(0.0..60.0),
                ],
                label,
            }
        })
        .collect()
}

/// Real rows, topped up with synthetic ones when there are fewer than
/// [`MIN_REAL_SAMPLES`]. A failing query falls back to synthetic only.
pub fn prepare_training_data(conn: &Connection, seed: u64) -> TrainingSet {
    let real = match load_real_samples(conn) {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("failed to load training rows: {e}");
            return synthetic_only(seed);
        }
    };

    if real.is_empty() {
        log::warn!("no real training rows, generating synthetic data");
        return synthetic_only(seed);
    }

    let real_count = real.len();
    let mut samples = real;
    let mut synthetic = 0;

    if real_count < MIN_REAL_SAMPLES {
        log::warn!("only {real_count} real training rows, appending synthetic data");
        samples.extend(synthetic_samples(SYNTHETIC_SAMPLES, seed));
        synthetic = SYNTHETIC_SAMPLES;
    }

    TrainingSet {
        samples,
        real: real_count,
        synthetic,
    }
}

fn synthetic_only(seed: u64) -> TrainingSet {
    TrainingSet {
        samples: synthetic_samples(SYNTHETIC_SAMPLES, seed),
        real: 0,
        synthetic: SYNTHETIC_SAMPLES,
    }
}
