//! Linear regressors fit on the normal equations

use crate::linalg::solve_symmetric;
use crate::metrics::r2_score;
use crate::{MathError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A regression algorithm that can be fit on a design matrix
pub trait Regressor: Debug + Send + Sync {
    /// Fit the regressor on `x` (one row per observation) and targets `y`
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<LinearModel>;

    /// Name of the regressor
    fn name(&self) -> &str;
}

/// A fitted model that maps feature rows to a scalar prediction
pub trait TrainedRegressor: Debug {
    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Predict a single row
    fn predict_row(&self, row: &[f64]) -> Result<f64>;

    /// Name of the algorithm that produced the model
    fn name(&self) -> &str;

    /// Coefficient of determination of the model on `(x, y)`
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let predicted = self.predict(x)?;
        r2_score(&y.to_vec(), &predicted.to_vec())
    }
}

/// Ordinary least squares with an intercept
#[derive(Debug, Clone)]
pub struct LeastSquares {
    name: String,
}

/// Least squares with an L2 penalty on the coefficients (not the intercept)
#[derive(Debug, Clone)]
pub struct Ridge {
    name: String,
    alpha: f64,
}

/// Fitted linear model: `intercept + coefficients · row`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Name of the algorithm that produced the model
    name: String,
    /// Intercept term
    intercept: f64,
    /// One coefficient per input column
    coefficients: Vec<f64>,
}

impl LeastSquares {
    pub fn new() -> Self {
        Self {
            name: "Linear Regression".to_string(),
        }
    }
}

impl Default for LeastSquares {
    fn default() -> Self {
        Self::new()
    }
}

impl Ridge {
    /// Create a ridge regressor with penalty `alpha`
    pub fn new(alpha: f64) -> Result<Self> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(MathError::InvalidInput(
                "Ridge alpha must be finite and positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Ridge Regression (alpha={})", alpha),
            alpha,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Regressor for LeastSquares {
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<LinearModel> {
        fit_linear(&self.name, x, y, 0.0)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Regressor for Ridge {
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<LinearModel> {
        fit_linear(&self.name, x, y, self.alpha)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn fit_linear(name: &str, x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> Result<LinearModel> {
    if x.nrows() == 0 {
        return Err(MathError::InsufficientData(
            "Cannot fit a regressor without observations".to_string(),
        ));
    }
    if y.len() != x.nrows() {
        return Err(MathError::InvalidInput(format!(
            "Target length ({}) doesn't match row count ({})",
            y.len(),
            x.nrows()
        )));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Targets contain non-finite values".to_string(),
        ));
    }

    let x_mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| MathError::CalculationError("Column means unavailable".to_string()))?;
    let y_mean = y.sum() / y.len() as f64;

    // Centering removes the intercept from the system so the penalty never touches it.
    let xc = x - &x_mean;
    let yc = y.mapv(|v| v - y_mean);

    let mut gram = xc.t().dot(&xc);
    for i in 0..gram.nrows() {
        gram[[i, i]] += alpha;
    }
    let rhs = xc.t().dot(&yc);

    let coefficients = solve_symmetric(&gram, &rhs)?;
    let intercept = y_mean - x_mean.dot(&coefficients);

    Ok(LinearModel {
        name: name.to_string(),
        intercept,
        coefficients: coefficients.to_vec(),
    })
}

impl LinearModel {
    /// Rebuild a model from stored parameters
    pub fn from_parts(name: impl Into<String>, intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            intercept,
            coefficients,
        }
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Number of input columns the model expects
    pub fn n_features(&self) -> usize {
        self.coefficients.len()
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

impl TrainedRegressor for LinearModel {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_width(x.ncols())?;
        let coefficients = ArrayView1::from(&self.coefficients[..]);
        Ok(x.dot(&coefficients).mapv(|v| v + self.intercept))
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        self.check_width(row.len())?;
        Ok(self.intercept
            + row
                .iter()
                .zip(&self.coefficients)
                .map(|(v, c)| v * c)
                .sum::<f64>())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
