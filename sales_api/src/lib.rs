//! # Sales API
//!
//! HTTP front end of the demand pipeline: predictions, prediction history,
//! historical market data and dashboard aggregates.

pub mod config;
pub mod error;
pub mod market;
pub mod routes;

pub use crate::config::ServerConfig;
pub use crate::error::{ApiError, ApiResult};
pub use crate::market::{MarketData, MarketDataStore};
pub use crate::routes::{router, AppState};

use demand_forecast::{ArtifactHandle, ArtifactStore, InferenceAdapter, MemoryPredictionStore};
use std::sync::Arc;

impl AppState {
    /// State over the artifact root of `config` with empty in-memory stores
    pub fn from_config(config: &ServerConfig) -> Self {
        let handle = ArtifactHandle::new(ArtifactStore::new(config.artifact_root.clone()));
        Self {
            adapter: Arc::new(InferenceAdapter::new(Arc::new(handle))),
            predictions: Arc::new(MemoryPredictionStore::new()),
            market: Arc::new(MarketDataStore::new()),
            default_page_size: config.default_page_size,
        }
    }
}
