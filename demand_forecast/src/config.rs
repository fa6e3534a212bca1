//! Configuration for the training job and shared logging settings

use crate::error::{DemandError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Logging configuration shared by the binaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Configuration of one schema-builder run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Historical sales CSV
    pub data_path: PathBuf,
    /// Root directory of the versioned artifact bundles
    pub artifact_root: PathBuf,
    /// Share of records held out for evaluation
    pub eval_ratio: f64,
    /// Seed of the evaluation split
    pub seed: u64,
    /// Ridge penalties tried after ordinary least squares
    pub ridge_alphas: Vec<f64>,
    /// Add a day-of-week feature
    pub include_day_of_week: bool,
    pub logging: LoggingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("retail_store_inventory.csv"),
            artifact_root: PathBuf::from("artifacts"),
            eval_ratio: 0.2,
            seed: 42,
            ridge_alphas: vec![1.0, 10.0],
            include_day_of_week: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DemandError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| DemandError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.eval_ratio > 0.0 && self.eval_ratio < 1.0) {
            return Err(DemandError::Config(format!(
                "eval_ratio must be between 0 and 1, got {}",
                self.eval_ratio
            )));
        }
        if let Some(alpha) = self
            .ridge_alphas
            .iter()
            .find(|a| !a.is_finite() || **a <= 0.0)
        {
            return Err(DemandError::Config(format!(
                "ridge_alphas must be finite and positive, got {}",
                alpha
            )));
        }
        if self.artifact_root.as_os_str().is_empty() {
            return Err(DemandError::Config(
                "artifact_root must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
