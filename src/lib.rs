//! # Retail Demand
//!
//! Umbrella crate of the retail demand workspace. It re-exports the three
//! member crates:
//!
//! - [`math`]: solver, regressors, scaler and metrics (`demand_math`)
//! - [`forecast`]: feature schema, training, artifacts and inference
//!   (`demand_forecast`)
//! - [`api`]: the HTTP service (`sales_api`)
//!
//! ## Example
//!
//! ```
//! use retail_demand_workspace::forecast::{CategoricalField, NumericField};
//!
//! assert_eq!(NumericField::ALL.len(), 6);
//! assert_eq!(CategoricalField::ALL.len(), 7);
//! ```

pub use demand_forecast as forecast;
pub use demand_math as math;
pub use sales_api as api;

/// Workspace version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
