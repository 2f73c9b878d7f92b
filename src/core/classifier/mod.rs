//! Touch classifier: labels a touch `short` or `long` from its duration and
//! session context.

pub mod dataset;
pub mod forest;
pub mod metrics;
pub mod scaler;
pub mod split;

use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::touch_type::TouchType;
use crate::utils::stats::round3;
use crate::utils::time::now_canonical;
use dataset::{FeatureRow, LABEL_LONG, Sample, prepare_training_data};
use forest::{ForestParams, RandomForest};
use metrics::{ClassificationReport, accuracy, classification_report};
use scaler::StandardScaler;
use serde::{Deserialize, Serialize};
use split::stratified_split;
use std::fs;
use std::path::Path;

pub const DEFAULT_SESSION_DURATION: f64 = 60.0;
pub const DEFAULT_TOTAL_TOUCHES: i64 = 1;
pub const DEFAULT_AVG_LIGHT: f64 = 512.0;
pub const DEFAULT_TIME_IN_SESSION: f64 = 0.0;

/// Fitted forest and the scaler it was trained behind, persisted together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub forest: RandomForest,
    pub scaler: StandardScaler,
    pub trained_at: String,
}

#[derive(Debug, Clone, Copy)]
pub struct TrainOptions {
    pub test_size: f64,
    pub seed: u64,
    pub params: ForestParams,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            params: ForestParams::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub accuracy: f64,
    pub train_size: usize,
    pub test_size: usize,
    pub real_samples: usize,
    pub synthetic_samples: usize,
    pub classification_report: ClassificationReport,
}

/// Unset context fields fall back to fixed defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionInput {
    pub duration: f64,
    pub session_duration: Option<f64>,
    pub total_touches: Option<i64>,
    pub avg_light: Option<f64>,
    pub time_in_session: Option<f64>,
}

impl PredictionInput {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    fn features(&self) -> FeatureRow {
        [
            self.duration,
            self.session_duration.unwrap_or(DEFAULT_SESSION_DURATION),
            self.total_touches.unwrap_or(DEFAULT_TOTAL_TOUCHES) as f64,
            self.avg_light.unwrap_or(DEFAULT_AVG_LIGHT),
            self.time_in_session.unwrap_or(DEFAULT_TIME_IN_SESSION),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub predicted_type: TouchType,
    pub probability_short: f64,
    pub probability_long: f64,
    pub confidence: f64,
}

#[derive(Debug, Default)]
pub struct TouchClassifier {
    bundle: Option<ModelBundle>,
}

impl TouchClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        self.bundle.is_some()
    }

    pub fn bundle(&self) -> Option<&ModelBundle> {
        self.bundle.as_ref()
    }

    /// Build the training set from the store and fit.
    pub fn train(&mut self, pool: &DbPool, opts: TrainOptions) -> AppResult<TrainingReport> {
        let set = prepare_training_data(&pool.conn, opts.seed);
        log::info!(
            "training set: {} samples ({} real, {} synthetic)",
            set.len(),
            set.real,
            set.synthetic
        );

        let mut report = self.train_on(&set.samples, opts)?;
        report.real_samples = set.real;
        report.synthetic_samples = set.synthetic;
        Ok(report)
    }

    /// Fit on an explicit sample set.
    pub fn train_on(&mut self, samples: &[Sample], opts: TrainOptions) -> AppResult<TrainingReport> {
        if samples.is_empty() {
            return Err(AppError::InsufficientData("no training samples".into()));
        }

        let (train, test) = stratified_split(samples, opts.test_size, opts.seed)?;

        let train_x: Vec<FeatureRow> = train.iter().map(|s| s.features).collect();
        let train_y: Vec<u8> = train.iter().map(|s| s.label).collect();
        let test_x: Vec<FeatureRow> = test.iter().map(|s| s.features).collect();
        let test_y: Vec<u8> = test.iter().map(|s| s.label).collect();

        let scaler = StandardScaler::fit(&train_x);
        let forest = RandomForest::fit(&scaler.transform(&train_x), &train_y, opts.params, opts.seed);

        let predicted: Vec<u8> = scaler
            .transform(&test_x)
            .iter()
            .map(|row| forest.predict(row))
            .collect();

        let acc = accuracy(&test_y, &predicted);
        log::info!(
            "model accuracy: {:.2}% ({} trees, {} train / {} test)",
            acc * 100.0,
            forest.n_trees(),
            train.len(),
            test.len()
        );

        self.bundle = Some(ModelBundle {
            forest,
            scaler,
            trained_at: now_canonical(),
        });

        Ok(TrainingReport {
            accuracy: acc,
            train_size: train.len(),
            test_size: test.len(),
            real_samples: 0,
            synthetic_samples: 0,
            classification_report: classification_report(&test_y, &predicted),
        })
    }

    pub fn predict(&self, input: &PredictionInput) -> AppResult<Prediction> {
        let bundle = self.bundle.as_ref().ok_or(AppError::NotTrained)?;

        let row = bundle.scaler.transform_row(&input.features());
        let [p_short, p_long] = bundle.forest.predict_proba(&row);

        let predicted_type = if bundle.forest.predict(&row) == LABEL_LONG {
            TouchType::Long
        } else {
            TouchType::Short
        };

        Ok(Prediction {
            predicted_type,
            probability_short: round3(p_short),
            probability_long: round3(p_long),
            confidence: round3(p_short.max(p_long)),
        })
    }

    /// Write forest and scaler as one JSON document.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let bundle = self.bundle.as_ref().ok_or(AppError::NotTrained)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, serde_json::to_string(bundle)?)?;
        log::info!("model saved to {}", path.display());
        Ok(())
    }

    /// Restore forest and scaler together.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::MissingArtifact(path.display().to_string()));
        }

        let raw = fs::read_to_string(path)?;
        let bundle: ModelBundle = serde_json::from_str(&raw)?;
        log::info!("model loaded from {}", path.display());

        Ok(Self {
            bundle: Some(bundle),
        })
    }
}
