//! Utility functions for the demand_forecast crate

use crate::error::{DemandError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Split `n` row indices into training and evaluation sets.
///
/// Rows are shuffled with a seeded generator so the same `(n, ratio, seed)`
/// always yields the same partition. The evaluation set holds
/// `ceil(n * test_ratio)` rows, clamped so both sides are non-empty.
pub fn train_test_split(n: usize, test_ratio: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(DemandError::Config(format!(
            "Evaluation ratio must be between 0 and 1, got {}",
            test_ratio
        )));
    }
    if n < 2 {
        return Err(DemandError::TrainingData(format!(
            "Need at least 2 records to hold out an evaluation split, got {}",
            n
        )));
    }

    let test_size = ((n as f64 * test_ratio).ceil() as usize).clamp(1, n - 1);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(test_size);
    Ok((train, indices))
}
