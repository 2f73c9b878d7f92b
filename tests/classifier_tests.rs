mod common;
use chrono::Duration;
use common::{hours_ago, open_pool, presence, session_end, temp_out, touch};
use std::path::Path;
use totemlog::core::classifier::dataset::{
    LABEL_LONG, LABEL_SHORT, SYNTHETIC_SAMPLES, Sample, prepare_training_data, synthetic_samples,
};
use totemlog::core::classifier::scaler::StandardScaler;
use totemlog::core::classifier::split::stratified_split;
use totemlog::core::classifier::{PredictionInput, TouchClassifier, TrainOptions};
use totemlog::core::collector::SessionCollector;
use totemlog::errors::AppError;
use totemlog::models::touch_type::TouchType;

fn trained() -> TouchClassifier {
    let mut clf = TouchClassifier::new();
    clf.train_on(&synthetic_samples(SYNTHETIC_SAMPLES, 42), TrainOptions::default())
        .unwrap();
    clf
}

#[test]
fn empty_store_trains_on_synthetic_rows_only() {
    let pool = open_pool("classifier_empty_store");
    let set = prepare_training_data(&pool.conn, 42);

    assert_eq!(set.real, 0);
    assert_eq!(set.synthetic, SYNTHETIC_SAMPLES);
    assert_eq!(set.len(), SYNTHETIC_SAMPLES);
}

#[test]
fn few_real_rows_are_topped_up_with_synthetic_ones() {
    let mut pool = open_pool("classifier_topped_up");
    let t = hours_ago(2);
    let mut batch = Vec::new();
    for (i, d) in [0.2, 0.6, 1.4, 1.9, 0.9].into_iter().enumerate() {
        let at = t + Duration::seconds(i as i64);
        batch.push(presence("train-1", at, 1.0));
        batch.push(touch("train-1", at, Some(d)));
    }
    // Idle touches never become training rows.
    batch.push(touch("train-1", t + Duration::seconds(5), None));
    batch.push(session_end("train-1", 6.0, t + Duration::seconds(6)));

    SessionCollector::new(&mut pool, "Lab")
        .ingest_batch(&batch)
        .unwrap();

    let set = prepare_training_data(&pool.conn, 42);
    assert_eq!(set.real, 5);
    assert_eq!(set.synthetic, SYNTHETIC_SAMPLES);
    assert_eq!(set.len(), 105);

    let longs = set.samples[..5].iter().filter(|s| s.label == LABEL_LONG).count();
    assert_eq!(longs, 2);
    // time_in_session of the third touch.
    assert_eq!(set.samples[2].features[4], 2.0);
}

#[test]
fn synthetic_rows_follow_the_label_rule() {
    let rows = synthetic_samples(200, 7);
    assert_eq!(rows, synthetic_samples(200, 7));

    for s in &rows {
        let d = s.features[0];
        if s.label == LABEL_SHORT {
            assert!((0.1..1.0).contains(&d));
        } else {
            assert!((1.0..2.0).contains(&d));
        }
        assert!((1.0..10.0).contains(&s.features[2]));
    }
}

#[test]
fn predicting_before_training_fails() {
    let clf = TouchClassifier::new();
    assert!(!clf.is_trained());
    assert!(matches!(
        clf.predict(&PredictionInput::new(0.5)),
        Err(AppError::NotTrained)
    ));
    assert!(matches!(
        clf.save(Path::new(&temp_out("classifier_untrained", "json"))),
        Err(AppError::NotTrained)
    ));
}

#[test]
fn loading_a_missing_model_fails() {
    let path = temp_out("classifier_missing_model", "json");
    assert!(matches!(
        TouchClassifier::load(Path::new(&path)),
        Err(AppError::MissingArtifact(_))
    ));
}

#[test]
fn synthetic_training_separates_short_from_long() {
    let mut clf = TouchClassifier::new();
    let report = clf
        .train_on(&synthetic_samples(SYNTHETIC_SAMPLES, 42), TrainOptions::default())
        .unwrap();

    assert!(report.accuracy > 0.8, "accuracy {}", report.accuracy);
    assert_eq!(report.train_size + report.test_size, SYNTHETIC_SAMPLES);
    assert_eq!(
        report.classification_report.short.support + report.classification_report.long.support,
        report.test_size
    );
    assert_eq!(clf.bundle().unwrap().forest.n_trees(), 100);

    let short = clf.predict(&PredictionInput::new(0.2)).unwrap();
    let long = clf.predict(&PredictionInput::new(1.9)).unwrap();
    assert_eq!(short.predicted_type, TouchType::Short);
    assert_eq!(long.predicted_type, TouchType::Long);

    for p in [short, long] {
        assert!((p.probability_short + p.probability_long - 1.0).abs() < 0.002);
        assert_eq!(p.confidence, p.probability_short.max(p.probability_long));
    }
}

#[test]
fn saved_model_predicts_identically_after_load() {
    let clf = trained();
    let path = temp_out("classifier_roundtrip", "json");
    clf.save(Path::new(&path)).unwrap();

    let restored = TouchClassifier::load(Path::new(&path)).unwrap();
    assert_eq!(restored.bundle(), clf.bundle());

    let input = PredictionInput {
        duration: 1.05,
        session_duration: Some(40.0),
        total_touches: Some(3),
        avg_light: Some(420.0),
        time_in_session: Some(12.0),
    };
    assert_eq!(restored.predict(&input).unwrap(), clf.predict(&input).unwrap());
}

#[test]
fn same_seed_gives_the_same_model() {
    let a = trained();
    let b = trained();
    let input = PredictionInput::new(0.97);
    assert_eq!(a.predict(&input).unwrap(), b.predict(&input).unwrap());
}

#[test]
fn split_needs_two_rows_per_class() {
    let one_long = vec![
        Sample { features: [0.2; 5], label: LABEL_SHORT },
        Sample { features: [0.3; 5], label: LABEL_SHORT },
        Sample { features: [1.5; 5], label: LABEL_LONG },
    ];
    assert!(matches!(
        stratified_split(&one_long, 0.2, 42),
        Err(AppError::InsufficientData(_))
    ));
    assert!(matches!(
        stratified_split(&[], 0.2, 42),
        Err(AppError::InsufficientData(_))
    ));
    assert!(stratified_split(&one_long, 1.0, 42).is_err());
}

#[test]
fn split_keeps_both_classes_on_both_sides() {
    let rows = synthetic_samples(SYNTHETIC_SAMPLES, 11);
    let (train, test) = stratified_split(&rows, 0.2, 42).unwrap();

    assert_eq!(train.len() + test.len(), rows.len());
    for side in [&train, &test] {
        assert!(side.iter().any(|s| s.label == LABEL_SHORT));
        assert!(side.iter().any(|s| s.label == LABEL_LONG));
    }
}

#[test]
fn scaler_leaves_constant_features_unscaled() {
    let rows = [[1.0, 5.0, 0.0, 0.0, 0.0], [3.0, 5.0, 0.0, 0.0, 0.0]];
    let scaler = StandardScaler::fit(&rows);

    assert_eq!(scaler.mean[0], 2.0);
    assert_eq!(scaler.scale[0], 1.0);
    assert_eq!(scaler.scale[1], 1.0);

    let out = scaler.transform_row(&[3.0, 7.0, 0.0, 0.0, 0.0]);
    assert_eq!(out[0], 1.0);
    assert_eq!(out[1], 2.0);
}
