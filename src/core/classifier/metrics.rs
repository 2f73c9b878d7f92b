use super::dataset::{LABEL_LONG, LABEL_SHORT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub short: ClassMetrics,
    pub long: ClassMetrics,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

/// Zero when nothing was predicted.
pub fn accuracy(truth: &[u8], predicted: &[u8]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    hits as f64 / truth.len() as f64
}

/// Undefined ratios (0/0) are reported as 0.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn class_metrics(truth: &[u8], predicted: &[u8], label: u8) -> ClassMetrics {
    let pairs = || truth.iter().zip(predicted);

    let tp = pairs().filter(|(t, p)| **t == label && **p == label).count();
    let predicted_pos = predicted.iter().filter(|p| **p == label).count();
    let support = truth.iter().filter(|t| **t == label).count();

    let precision = ratio(tp, predicted_pos);
    let recall = ratio(tp, support);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassMetrics {
        precision,
        recall,
        f1_score,
        support,
    }
}

pub fn classification_report(truth: &[u8], predicted: &[u8]) -> ClassificationReport {
    let short = class_metrics(truth, predicted, LABEL_SHORT);
    let long = class_metrics(truth, predicted, LABEL_LONG);
    let support = short.support + long.support;

    let macro_avg = ClassMetrics {
        precision: (short.precision + long.precision) / 2.0,
        recall: (short.recall + long.recall) / 2.0,
        f1_score: (short.f1_score + long.f1_score) / 2.0,
        support,
    };

    let weighted = |f: fn(&ClassMetrics) -> f64| {
        if support == 0 {
            0.0
        } else {
            (f(&short) * short.support as f64 + f(&long) * long.support as f64) / support as f64
        }
    };

    let weighted_avg = ClassMetrics {
        precision: weighted(|m| m.precision),
        recall: weighted(|m| m.recall),
        f1_score: weighted(|m| m.f1_score),
        support,
    };

    ClassificationReport {
        short,
        long,
        macro_avg,
        weighted_avg,
    }
}
