use super::dataset::{FeatureRow, N_FEATURES};
use serde::{Deserialize, Serialize};

/// Per-feature standardization: `(x - mean) / std`, population std.
/// Constant features get a scale of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: FeatureRow,
    pub scale: FeatureRow,
}

impl StandardScaler {
    pub fn fit(rows: &[FeatureRow]) -> Self {
        let mut mean = [0.0; N_FEATURES];
        let mut scale = [1.0; N_FEATURES];

        if rows.is_empty() {
            return Self { mean, scale };
        }

        let n = rows.len() as f64;
        for f in 0..N_FEATURES {
            let m = rows.iter().map(|r| r[f]).sum::<f64>() / n;
            let var = rows.iter().map(|r| (r[f] - m).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();

            mean[f] = m;
            scale[f] = if std > 0.0 { std } else { 1.0 };
        }

        Self { mean, scale }
    }

    pub fn transform_row(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = [0.0; N_FEATURES];
        for (f, v) in out.iter_mut().enumerate() {
            *v = (row[f] - self.mean[f]) / self.scale[f];
        }
        out
    }

    pub fn transform(&self, rows: &[FeatureRow]) -> Vec<FeatureRow> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}
