mod common;
use chrono::Duration;
use common::{TOTEM, hours_ago, ldr, open_pool, presence, session_end, touch};
use totemlog::core::aggregator::{compute_aggregate, interaction_score};
use totemlog::core::collector::SessionCollector;
use totemlog::db::queries::{load_aggregate, load_events_by_session, load_session};
use totemlog::models::touch_type::TouchType;
use totemlog::sim::{SensorFeed, SensorSimulator};

#[test]
fn three_touch_session_scores_46_5() {
    let t = hours_ago(1);
    let events = vec![
        touch("s1", t, Some(0.3)),
        touch("s1", t + Duration::seconds(1), Some(1.2)),
        touch("s1", t + Duration::seconds(2), Some(0.8)),
        session_end("s1", 3.0, t + Duration::seconds(3)),
    ];

    let agg = compute_aggregate("s1", TOTEM, &events);

    assert_eq!(agg.total_touches, 3);
    assert_eq!(agg.short_touches, 2);
    assert_eq!(agg.long_touches, 1);
    assert_eq!(agg.session_duration, 2.3);
    assert_eq!(agg.interaction_score, 46.5);
}

#[test]
fn inactive_touches_presence_ticks_and_light_mean() {
    let t = hours_ago(1);
    let events = vec![
        touch("s1", t, None),
        presence("s1", t, 1.0),
        presence("s1", t + Duration::seconds(1), 0.0),
        presence("s1", t + Duration::seconds(2), 1.0),
        ldr("s1", t, 600.0),
        ldr("s1", t + Duration::seconds(1), 701.0),
    ];

    let agg = compute_aggregate("s1", TOTEM, &events);

    assert_eq!(agg.total_touches, 0);
    assert_eq!(agg.avg_presence_time, 2.0);
    assert_eq!(agg.avg_light_level, 650.5);
    assert_eq!(agg.interaction_score, 0.0);
}

#[test]
fn no_light_readings_average_to_zero() {
    let agg = compute_aggregate("s1", TOTEM, &[presence("s1", hours_ago(1), 1.0)]);
    assert_eq!(agg.avg_light_level, 0.0);
}

#[test]
fn interaction_score_is_clamped() {
    assert_eq!(interaction_score(0, 0.0, 0), 0.0);
    // Touch and duration terms saturate at 50 and 30.
    assert_eq!(interaction_score(20, 100.0, 0), 80.0);
    // Long-touch term is only bounded by the final clamp.
    assert_eq!(interaction_score(20, 100.0, 20), 100.0);
    assert_eq!(interaction_score(1, 0.5, 1), 17.5);
}

#[test]
fn ingest_batch_runs_the_session_lifecycle() {
    let mut pool = open_pool("aggregator_ingest");
    let t = hours_ago(2);
    let events = vec![
        presence("batch-1", t, 1.0),
        touch("batch-1", t, Some(0.3)),
        ldr("batch-1", t, 800.0),
        presence("batch-1", t + Duration::seconds(1), 1.0),
        touch("batch-1", t + Duration::seconds(1), Some(1.2)),
        ldr("batch-1", t + Duration::seconds(1), 820.0),
        session_end("batch-1", 2.0, t + Duration::seconds(2)),
    ];

    let stats = SessionCollector::new(&mut pool, "Lab")
        .ingest_batch(&events)
        .unwrap();

    assert_eq!(stats.session_id, "batch-1");
    assert_eq!(stats.events_submitted, 6);
    assert_eq!(stats.events_stored, 6);
    assert_eq!(stats.touch_events, 2);

    let session = load_session(&pool.conn, "batch-1").unwrap().unwrap();
    assert!(session.is_closed());
    assert_eq!(session.started_at, t);
    assert_eq!(session.duration_seconds, Some(2.0));
    assert_eq!(session.total_interactions, Some(2));

    // The marker is consumed, never stored.
    assert_eq!(load_events_by_session(&pool.conn, "batch-1").unwrap().len(), 6);

    let agg = load_aggregate(&pool.conn, "batch-1").unwrap().unwrap();
    assert_eq!(agg.long_touches, 1);
    assert_eq!(agg.avg_light_level, 810.0);
    assert_eq!(agg.interaction_score, interaction_score(2, 1.5, 1));

    // Second close of the same session is refused.
    assert!(
        SessionCollector::new(&mut pool, "Lab")
            .ingest_batch(&events)
            .is_err()
    );
}

#[test]
fn ingest_rejects_mixed_sessions() {
    let mut pool = open_pool("aggregator_mixed");
    let t = hours_ago(1);
    let events = vec![presence("a", t, 1.0), presence("b", t, 1.0)];

    assert!(SessionCollector::new(&mut pool, "Lab").ingest_batch(&events).is_err());
    assert!(load_session(&pool.conn, "a").unwrap().is_none());
}

#[test]
fn simulated_sessions_are_stored_and_closed() {
    let mut pool = open_pool("aggregator_simulated");
    let mut feed = SensorSimulator::new(TOTEM, Some(7));

    let stats = SessionCollector::new(&mut pool, "Lab")
        .collect_and_store(&mut feed, 20)
        .unwrap();

    assert_eq!(stats.events_stored, stats.events_submitted);
    assert_eq!(stats.session_duration, 20.0);

    let session = load_session(&pool.conn, &stats.session_id).unwrap().unwrap();
    assert_eq!(session.totem_id, TOTEM);
    assert_eq!(session.total_interactions, Some(stats.touch_events));

    let agg = load_aggregate(&pool.conn, &stats.session_id).unwrap().unwrap();
    assert!((0.0..=100.0).contains(&agg.interaction_score));
    assert_eq!(agg.total_touches, stats.touch_events);
}

#[test]
fn simulator_touches_follow_presence() {
    let mut feed = SensorSimulator::new(TOTEM, Some(3));
    let (sid, _) = feed.start_session();
    let events = feed.interaction_cycle(50);

    assert!(events.last().is_some_and(|e| e.is_session_end()));
    assert!(events.iter().all(|e| e.session_id() == sid));

    let ticks = events.iter().filter(|e| !e.is_session_end()).count();
    let presences = events
        .iter()
        .filter(|e| matches!(e, totemlog::models::raw_event::RawEvent::Presence(p) if p.value == 1.0))
        .count();
    let touches = events
        .iter()
        .filter(|e| matches!(e, totemlog::models::raw_event::RawEvent::Touch(_)))
        .count();

    // One presence + one ldr per second, one touch per present second.
    assert_eq!(ticks, 100 + presences);
    assert_eq!(touches, presences);

    for t in events.iter().filter_map(|e| e.active_touch()) {
        let d = t.duration.unwrap();
        assert!((0.1..=2.0).contains(&d));
        assert_ne!(t.touch_type, TouchType::None);
    }
}

#[test]
fn rejected_reading_is_skipped_and_the_session_still_closes() {
    let mut pool = open_pool("aggregator_rejected_reading");
    pool.conn
        .execute_batch(
            "CREATE TRIGGER reject_999 BEFORE INSERT ON sensor_events
             WHEN NEW.value = 999
             BEGIN SELECT RAISE(ABORT, 'reading rejected'); END;",
        )
        .unwrap();

    let t = hours_ago(1);
    let events = vec![
        presence("partial", t, 1.0),
        ldr("partial", t, 999.0),
        touch("partial", t + Duration::seconds(1), Some(0.5)),
        session_end("partial", 2.0, t + Duration::seconds(2)),
    ];

    let stats = SessionCollector::new(&mut pool, "Lab")
        .ingest_batch(&events)
        .unwrap();

    assert_eq!(stats.events_submitted, 3);
    assert_eq!(stats.events_stored, 2);
    assert_eq!(load_events_by_session(&pool.conn, "partial").unwrap().len(), 2);

    let session = load_session(&pool.conn, "partial").unwrap().unwrap();
    assert!(session.is_closed());
    assert_eq!(session.total_interactions, Some(1));

    let agg = load_aggregate(&pool.conn, "partial").unwrap().unwrap();
    assert_eq!(agg.total_touches, 1);
}
