//! # Demand Forecast
//!
//! The train/serve feature pipeline for retail demand forecasting.
//!
//! ## Features
//!
//! - Historical sales loading from CSV (via polars)
//! - A frozen, versioned [`FeatureSchema`] shared by training and inference
//! - Schema builder with a seeded evaluation split and candidate selection
//! - Atomically published artifact bundles with a `CURRENT` pointer
//! - An inference adapter over a lazily loaded [`ArtifactHandle`]
//! - A prediction record store with aggregate statistics
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::{ArtifactHandle, ArtifactStore, BuilderConfig, DataLoader};
//! use demand_forecast::{InferenceAdapter, MemoryPredictionStore, PredictionRequest, SchemaBuilder};
//! use std::sync::Arc;
//!
//! # fn main() -> demand_forecast::Result<()> {
//! // Train and publish
//! let records = DataLoader::from_csv("retail_store_inventory.csv")?;
//! let trained = SchemaBuilder::new(BuilderConfig::default())?.build(&records)?;
//! let store = ArtifactStore::new("artifacts");
//! store.publish(trained)?;
//!
//! // Serve
//! let adapter = InferenceAdapter::new(Arc::new(ArtifactHandle::new(store)));
//! let request = PredictionRequest::from_json(br#"{"store_id": "S001"}"#)?;
//! let outcome = adapter.predict_and_record(&request, &MemoryPredictionStore::new())?;
//! println!("{} units", outcome.predicted_sales);
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod builder;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod fields;
pub mod inference;
pub mod records;
pub mod request;
pub mod schema;
pub mod telemetry;
pub mod utils;

// Re-export commonly used types
pub use crate::artifacts::{ArtifactBundle, ArtifactStore, BundleManifest};
pub use crate::builder::{BuilderConfig, SchemaBuilder, TrainedBundle, TrainingReport};
pub use crate::config::{LoggingConfig, TrainingConfig};
pub use crate::data::{DataLoader, RawRecord};
pub use crate::error::{DemandError, Result};
pub use crate::features::{DatePart, FeatureVector};
pub use crate::fields::{CategoricalField, NumericField};
pub use crate::inference::{ArtifactHandle, InferenceAdapter, PredictionOutcome};
pub use crate::records::{
    MemoryPredictionStore, NewPrediction, PredictionRecord, PredictionStats, PredictionStore,
};
pub use crate::request::{FieldValue, PredictionRequest, ValidatedRequest};
pub use crate::schema::{EncodingOptions, FeatureSchema};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
