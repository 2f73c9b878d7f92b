use super::dataset::Sample;
use crate::errors::{AppError, AppResult};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

/// Stratified train/test split.
///
/// Each class contributes `round(n_c * test_size)` rows to the test side,
/// clamped so both sides keep at least one row of every class.
pub fn stratified_split(
    samples: &[Sample],
    test_size: f64,
    seed: u64,
) -> AppResult<(Vec<Sample>, Vec<Sample>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::Other(format!(
            "test size must be within (0, 1), got {test_size}"
        )));
    }
    if samples.is_empty() {
        return Err(AppError::InsufficientData("empty training set".into()));
    }

    let mut by_class: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, s) in samples.iter().enumerate() {
        by_class.entry(s.label).or_default().push(i);
    }

    if let Some((label, idx)) = by_class.iter().find(|(_, idx)| idx.len() < 2) {
        return Err(AppError::InsufficientData(format!(
            "class {label} has {} sample(s), at least 2 required",
            idx.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for idx in by_class.values_mut() {
        idx.shuffle(&mut rng);

        let n = idx.len();
        let n_test = ((n as f64 * test_size).round() as usize).clamp(1, n - 1);

        test.extend(idx[..n_test].iter().map(|&i| samples[i].clone()));
        train.extend(idx[n_test..].iter().map(|&i| samples[i].clone()));
    }

    Ok((train, test))
}
