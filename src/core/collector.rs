//! Session lifecycle: open, persist readings one by one, close, aggregate.

use crate::core::aggregator::compute_aggregate;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::{
    create_session, end_session, ensure_totem, insert_event, insert_session_aggregate,
};
use crate::errors::{AppError, AppResult};
use crate::models::raw_event::RawEvent;
use crate::sim::SensorFeed;
use crate::utils::stats::round2;
use crate::utils::time::seconds_between;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub session_id: String,
    pub events_stored: usize,
    pub events_submitted: usize,
    pub touch_events: i64,
    pub session_duration: f64,
    pub interaction_score: f64,
}

pub struct SessionCollector<'a> {
    pool: &'a mut DbPool,
    location: String,
}

impl<'a> SessionCollector<'a> {
    /// `location` is used for totems seen for the first time.
    pub fn new(pool: &'a mut DbPool, location: &str) -> Self {
        Self {
            pool,
            location: location.to_string(),
        }
    }

    /// Run one interaction cycle of `feed` and persist it.
    pub fn collect_and_store<F: SensorFeed>(
        &mut self,
        feed: &mut F,
        duration_seconds: u32,
    ) -> AppResult<CollectionStats> {
        let totem_id = feed.totem_id().to_string();
        ensure_totem(&self.pool.conn, &totem_id, &self.location)?;

        let (session_id, started_at) = feed.start_session();
        create_session(&self.pool.conn, &session_id, &totem_id, &started_at)?;
        log::debug!("session {session_id} opened for {totem_id}");

        let events = feed.interaction_cycle(duration_seconds);
        self.store_batch("collect", &session_id, &totem_id, started_at, &events)
    }

    /// Persist a pre-recorded batch belonging to a single session.
    ///
    /// The session starts at the earliest reading; a batch made of a bare
    /// marker, mixing sessions or mixing totems is rejected before anything
    /// is written.
    pub fn ingest_batch(&mut self, events: &[RawEvent]) -> AppResult<CollectionStats> {
        let readings: Vec<&RawEvent> = events.iter().filter(|e| !e.is_session_end()).collect();
        let Some(first) = readings.first() else {
            return Err(AppError::Other("batch contains no sensor readings".into()));
        };

        let session_id = first.session_id().to_string();
        if let Some(other) = events.iter().find(|e| e.session_id() != session_id) {
            return Err(AppError::Other(format!(
                "batch mixes sessions: '{}' and '{}'",
                session_id,
                other.session_id()
            )));
        }

        let totem_id = totem_of(first).to_string();
        if readings.iter().any(|e| totem_of(e) != totem_id) {
            return Err(AppError::Other(format!(
                "batch for session {session_id} mixes totems"
            )));
        }

        let started_at = readings
            .iter()
            .map(|e| e.timestamp())
            .min()
            .unwrap_or_else(Utc::now);

        ensure_totem(&self.pool.conn, &totem_id, &self.location)?;
        create_session(&self.pool.conn, &session_id, &totem_id, &started_at)?;

        self.store_batch("ingest", &session_id, &totem_id, started_at, events)
    }

    fn store_batch(
        &mut self,
        operation: &str,
        session_id: &str,
        totem_id: &str,
        started_at: DateTime<Utc>,
        events: &[RawEvent],
    ) -> AppResult<CollectionStats> {
        let mut submitted = 0;
        let mut stored = 0;

        // Each reading is its own write: one bad row must not sink the batch.
        for ev in events.iter().filter(|e| !e.is_session_end()) {
            submitted += 1;
            match insert_event(&self.pool.conn, ev) {
                Ok(_) => stored += 1,
                Err(e) => log::warn!("session {session_id}: event skipped: {e}"),
            }
        }

        let (ended_at, duration) = events
            .iter()
            .find_map(|e| match e {
                RawEvent::SessionEnd(m) => Some((m.ended_at, m.duration)),
                _ => None,
            })
            .unwrap_or_else(|| {
                let now = Utc::now();
                (now, seconds_between(&started_at, &now))
            });

        let touch_events = events.iter().filter(|e| e.active_touch().is_some()).count() as i64;

        end_session(&self.pool.conn, session_id, &ended_at, duration, touch_events)?;

        let aggregate = compute_aggregate(session_id, totem_id, events);
        insert_session_aggregate(&self.pool.conn, &aggregate)?;

        ttlog_quiet(
            &self.pool.conn,
            operation,
            session_id,
            &format!(
                "{stored}/{submitted} events stored, {touch_events} touches, score {:.2}",
                aggregate.interaction_score
            ),
        );

        Ok(CollectionStats {
            session_id: session_id.to_string(),
            events_stored: stored,
            events_submitted: submitted,
            touch_events,
            session_duration: round2(duration),
            interaction_score: aggregate.interaction_score,
        })
    }
}

fn totem_of(ev: &RawEvent) -> &str {
    match ev {
        RawEvent::Touch(t) => &t.totem_id,
        RawEvent::Presence(p) => &p.totem_id,
        RawEvent::Ldr(l) => &l.totem_id,
        RawEvent::SessionEnd(_) => "",
    }
}
