//! Column-wise standardization

use crate::{MathError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Standard scaler: subtracts the column mean and divides by the population
/// standard deviation learned at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-column mean
    means: Vec<f64>,
    /// Per-column divisor, 1.0 for zero-variance columns
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn means and scales from the rows of `x`
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(MathError::InsufficientData(
                "Cannot fit a scaler on an empty matrix".to_string(),
            ));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Scaler input contains non-finite values".to_string(),
            ));
        }

        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| MathError::CalculationError("Column means unavailable".to_string()))?
            .to_vec();
        let scales = x
            .std_axis(Axis(0), 0.0)
            .iter()
            .map(|&s| if s > f64::EPSILON { s } else { 1.0 })
            .collect();

        Ok(Self { means, scales })
    }

    /// Rebuild a scaler from stored parameters
    pub fn from_parts(means: Vec<f64>, scales: Vec<f64>) -> Result<Self> {
        if means.len() != scales.len() {
            return Err(MathError::DimensionMismatch {
                expected: means.len(),
                found: scales.len(),
            });
        }
        if scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(MathError::InvalidInput(
                "Scales must be finite and positive".to_string(),
            ));
        }
        Ok(Self { means, scales })
    }

    /// Number of columns the scaler was fit on
    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Scale every row of `x`
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        let mut scaled = x.clone();
        for mut row in scaled.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (*value - self.means[j]) / self.scales[j];
            }
        }
        Ok(scaled)
    }

    /// Scale a single row
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (mean, scale))| (v - mean) / scale)
            .collect())
    }

    fn check_width(&self, found: usize) -> Result<()> {
        if found != self.n_features() {
            return Err(MathError::DimensionMismatch {
                expected: self.n_features(),
                found,
            });
        }
        Ok(())
    }
}
