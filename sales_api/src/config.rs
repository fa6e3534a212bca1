//! Server configuration

use demand_forecast::{DemandError, LoggingConfig, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Settings of the HTTP service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Root directory of the versioned artifact bundles
    pub artifact_root: PathBuf,
    /// Training-format CSV imported into the market data table at start
    pub market_data: Option<PathBuf>,
    /// Rows per import batch
    pub import_batch_size: usize,
    /// Rows returned by `GET /api/market-data/` without a `limit`
    pub default_page_size: usize,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            artifact_root: PathBuf::from("artifacts"),
            market_data: None,
            import_batch_size: 1000,
            default_page_size: 100,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
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
        if self.import_batch_size == 0 {
            return Err(DemandError::Config(
                "import_batch_size must be positive".to_string(),
            ));
        }
        if self.default_page_size == 0 {
            return Err(DemandError::Config(
                "default_page_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
