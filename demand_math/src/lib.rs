//! # Demand Math
//!
//! Numerical building blocks for the demand forecasting pipeline.
//! This crate provides a small dense solver, linear regressors, a standard
//! scaler and the regression metrics used to compare fitted candidates.

use thiserror::Error;

pub mod linalg;
pub mod metrics;
pub mod regression;
pub mod scaling;

pub use metrics::{mean_absolute_error, r2_score, root_mean_squared_error, RegressionMetrics};
pub use regression::{LeastSquares, LinearModel, Regressor, Ridge, TrainedRegressor};
pub use scaling::StandardScaler;

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected} columns, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_message_names_both_widths() {
        let err = MathError::DimensionMismatch {
            expected: 4,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected 4 columns, found 3"
        );
    }
}
