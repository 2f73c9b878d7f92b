mod common;
use common::{insert_row, insert_session, open_pool, values_of};
use totemlog::db::pool::DbPool;
use totemlog::core::cleaner::{DataCleaner, ViolationKind, quality_score};
use totemlog::utils::time::to_canonical;

const T0: &str = "2025-01-01T10:00:00.000000Z";
const T1: &str = "2025-01-01T10:00:01.000000Z";

#[test]
fn remove_duplicates_keeps_lowest_id_and_is_idempotent() {
    let mut pool = open_pool("cleaner_dedup");

    let keep = insert_row(&pool, "s1", "presence", 1.0, T0);
    insert_row(&pool, "s1", "presence", 1.0, T0);
    insert_row(&pool, "s1", "presence", 0.0, T0);
    insert_row(&pool, "s1", "presence", 1.0, T1);
    // Same instant, other sensor: not a duplicate.
    insert_row(&pool, "s1", "ldr", 700.0, T0);

    let mut cleaner = DataCleaner::new(&mut pool);
    assert_eq!(cleaner.remove_duplicates().unwrap(), 2);
    assert_eq!(cleaner.remove_duplicates().unwrap(), 0);

    let survivor: i64 = pool
        .conn
        .query_row(
            "SELECT id FROM sensor_events WHERE event_type = 'presence' AND timestamp = ?1",
            [T0],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(survivor, keep);
}

#[test]
fn ldr_out_of_range_values_are_flagged_and_set_to_midpoint() {
    let mut pool = open_pool("cleaner_ldr_repair");
    for (i, v) in [100.0, 1100.0, -5.0, 512.0].into_iter().enumerate() {
        insert_row(&pool, "s1", "ldr", v, &format!("2025-01-01T10:00:0{i}.000000Z"));
    }

    let outcome = DataCleaner::new(&mut pool).validate_sensor_values().unwrap();

    assert_eq!(outcome.count, 2);
    assert!(outcome.issues.iter().all(|i| i.kind == ViolationKind::InvalidLdr));
    assert_eq!(values_of(&pool, "ldr"), vec![100.0, 512.0, 512.0, 512.0]);
}

#[test]
fn binary_sensor_violations_are_forced_to_zero_and_validation_closes() {
    let mut pool = open_pool("cleaner_binary_repair");
    insert_row(&pool, "s1", "touch", 3.0, T0);
    insert_row(&pool, "s1", "presence", -1.0, T0);
    insert_row(&pool, "s1", "presence", 1.0, T1);

    let mut cleaner = DataCleaner::new(&mut pool);
    let first = cleaner.validate_sensor_values().unwrap();
    assert_eq!(first.count, 2);
    assert!(first.issues.iter().all(|i| i.kind == ViolationKind::InvalidValue));

    // Nothing left to find after repair.
    assert_eq!(cleaner.validate_sensor_values().unwrap().count, 0);
    assert_eq!(cleaner.get_data_quality_report().unwrap().records_with_problems, 0);

    assert_eq!(values_of(&pool, "touch"), vec![0.0]);
    assert_eq!(values_of(&pool, "presence"), vec![0.0, 1.0]);
}

#[test]
fn standardize_timestamps_rewrites_once() {
    let mut pool = open_pool("cleaner_standardize");
    insert_row(&pool, "s1", "ldr", 500.0, "2025-01-01 12:00:00+02:00");
    insert_row(&pool, "s1", "ldr", 501.0, "2025-01-01 10:00:05");
    insert_row(&pool, "s1", "ldr", 502.0, T1);

    let mut cleaner = DataCleaner::new(&mut pool);
    assert_eq!(cleaner.standardize_timestamps().unwrap(), 2);
    assert_eq!(cleaner.standardize_timestamps().unwrap(), 0);

    let stamps: Vec<String> = {
        let mut stmt = pool
            .conn
            .prepare("SELECT timestamp FROM sensor_events ORDER BY id")
            .unwrap();
        stmt.query_map([], |r| r.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    };
    assert_eq!(
        stamps,
        vec![
            T0.to_string(),
            "2025-01-01T10:00:05.000000Z".to_string(),
            T1.to_string()
        ]
    );
}

#[test]
fn retention_deletes_events_before_their_empty_sessions() {
    let mut pool = open_pool("cleaner_retention");
    let old = to_canonical(&(chrono::Utc::now() - chrono::Duration::days(200)));
    let recent = to_canonical(&(chrono::Utc::now() - chrono::Duration::days(1)));

    insert_session(&pool, "old", &old);
    insert_row(&pool, "old", "presence", 1.0, &old);
    insert_row(&pool, "old", "ldr", 600.0, &old);

    // Old session that still owns a recent event survives.
    insert_session(&pool, "straddling", &old);
    insert_row(&pool, "straddling", "presence", 1.0, &recent);

    insert_session(&pool, "recent", &recent);
    insert_row(&pool, "recent", "presence", 1.0, &recent);

    let deleted = DataCleaner::new(&mut pool).remove_old_data(90).unwrap();
    assert_eq!(deleted, 3);

    let sessions: i64 = pool
        .conn
        .query_row("SELECT COUNT(*) FROM sessions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(sessions, 2);
}

#[test]
fn clean_all_runs_every_step() {
    let mut pool = open_pool("cleaner_clean_all");
    insert_row(&pool, "s1", "ldr", 2000.0, "2025-01-01 10:00:00");
    insert_row(&pool, "s1", "ldr", 2000.0, "2025-01-01 10:00:00");
    insert_row(&pool, "s1", "touch", 1.0, T1);

    let summary = DataCleaner::new(&mut pool).clean_all();

    assert_eq!(summary.duplicates_removed, 1);
    assert_eq!(summary.invalid_records_fixed, 1);
    assert_eq!(summary.timestamps_standardized, 1);
}

#[test]
fn quality_report_on_empty_store_scores_100() {
    let mut pool = DbPool::in_memory().unwrap();
    let report = DataCleaner::new(&mut pool).get_data_quality_report().unwrap();

    assert_eq!(report.total_records, 0);
    assert!(report.records_by_type.is_empty());
    assert_eq!(report.quality_score, 100.0);
}

#[test]
fn quality_report_counts_problems() {
    let mut pool = open_pool("cleaner_quality_counts");
    insert_row(&pool, "s1", "ldr", 1500.0, T0);
    insert_row(&pool, "s1", "ldr", 500.0, T1);
    insert_row(&pool, "s1", "touch", 1.0, T0);
    insert_row(&pool, "s1", "presence", 0.0, T0);

    let report = DataCleaner::new(&mut pool).get_data_quality_report().unwrap();

    assert_eq!(report.total_records, 4);
    assert_eq!(report.records_by_type.get("ldr"), Some(&2));
    assert_eq!(report.records_with_problems, 1);
    assert_eq!(report.quality_score, 75.0);
}

#[test]
fn quality_score_stays_within_bounds() {
    assert_eq!(quality_score(0, 0), 100.0);
    assert_eq!(quality_score(10, 0), 100.0);
    assert_eq!(quality_score(10, 10), 0.0);
    assert_eq!(quality_score(3, 1), 66.67);
    for problems in 0..=7 {
        let s = quality_score(7, problems);
        assert!((0.0..=100.0).contains(&s));
    }
}
