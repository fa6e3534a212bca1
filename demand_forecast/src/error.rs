//! Error types for the demand_forecast crate

use demand_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum DemandError {
    /// A request was malformed or missing fields; raised before any model work
    #[error("Validation error: {0}")]
    Validation(String),

    /// The model, preprocessor or schema could not be loaded
    #[error("Model unavailable: {0}")]
    ArtifactUnavailable(String),

    /// A feature frame does not line up with the frozen feature schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Training input is empty or lacks a required field
    #[error("Training data error: {0}")]
    TrainingData(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// A record was not found in the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failure inside a record store
    #[error("Store error: {0}")]
    Store(String),

    /// Error from numerical routines
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),

    /// Error while encoding or decoding JSON artifacts
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DemandError {
    /// Whether the caller, rather than the service, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, DemandError::Validation(_) | DemandError::NotFound(_))
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, DemandError>;

impl From<PolarsError> for DemandError {
    fn from(err: PolarsError) -> Self {
        DemandError::Polars(err.to_string())
    }
}

impl From<serde_json::Error> for DemandError {
    fn from(err: serde_json::Error) -> Self {
        DemandError::Serialization(err.to_string())
    }
}
