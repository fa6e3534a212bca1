//! Inference adapter: validated request in, prediction out
//!
//! Artifacts are reached only through an [`ArtifactHandle`] passed in at
//! construction. The handle loads the current bundle on first use and keeps
//! the outcome, success or failure, for the rest of the process.

use crate::artifacts::{ArtifactBundle, ArtifactStore};
use crate::error::{DemandError, Result};
use crate::features::FeatureVector;
use crate::fields::CategoricalField;
use crate::records::{NewPrediction, PredictionStore};
use crate::request::{PredictionRequest, ValidatedRequest};
use demand_math::{MathError, TrainedRegressor};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::{error, info};
use uuid::Uuid;

type LoadFn = Box<dyn Fn() -> Result<ArtifactBundle> + Send + Sync>;

/// Lazily loaded, immutable artifact bundle shared across requests
pub struct ArtifactHandle {
    loader: LoadFn,
    cell: OnceLock<std::result::Result<Arc<ArtifactBundle>, String>>,
}

impl std::fmt::Debug for ArtifactHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactHandle")
            .field("loaded", &self.cell.get().map(|r| r.is_ok()))
            .finish()
    }
}

impl ArtifactHandle {
    /// Handle that loads the current bundle of `store` on first use
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            loader: Box::new(move || store.load_current()),
            cell: OnceLock::new(),
        }
    }

    /// Handle over a bundle that is already in memory
    pub fn from_bundle(bundle: ArtifactBundle) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(Arc::new(bundle)));
        Self {
            loader: Box::new(|| {
                Err(DemandError::ArtifactUnavailable(
                    "Bundle was provided in memory".to_string(),
                ))
            }),
            cell,
        }
    }

    /// Handle whose every access fails with `reason`
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Err(reason.into()));
        Self {
            loader: Box::new(|| {
                Err(DemandError::ArtifactUnavailable(
                    "Handle is unavailable".to_string(),
                ))
            }),
            cell,
        }
    }

    /// The loaded bundle; loads at most once per handle
    pub fn get(&self) -> Result<Arc<ArtifactBundle>> {
        let outcome = self.cell.get_or_init(|| match (self.loader)() {
            Ok(bundle) => {
                info!("Artifact bundle {} is ready", bundle.version);
                Ok(Arc::new(bundle))
            }
            Err(e) => {
                error!("Artifact bundle failed to load: {}", e);
                match e {
                    DemandError::ArtifactUnavailable(reason) => Err(reason),
                    other => Err(other.to_string()),
                }
            }
        });
        outcome
            .clone()
            .map_err(DemandError::ArtifactUnavailable)
    }

    /// Whether a load has been attempted and succeeded
    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }
}

/// Result of a recorded prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutcome {
    pub predicted_sales: f64,
    pub prediction_id: Uuid,
    #[serde(skip)]
    pub model_version: String,
}

#[derive(Debug, Clone)]
pub struct InferenceAdapter {
    artifacts: Arc<ArtifactHandle>,
}

impl InferenceAdapter {
    pub fn new(artifacts: Arc<ArtifactHandle>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &Arc<ArtifactHandle> {
        &self.artifacts
    }

    /// Schema-aligned feature vector of a validated request
    pub fn feature_vector(&self, request: &ValidatedRequest) -> Result<FeatureVector> {
        let bundle = self.artifacts.get()?;
        bundle.schema.encode(request.record())
    }

    /// Validate, encode, scale and predict without recording anything
    pub fn predict(&self, request: &PredictionRequest) -> Result<f64> {
        self.run(request).map(|(_, prediction, _)| prediction)
    }

    /// Predict and record the prediction in `store`
    pub fn predict_and_record(
        &self,
        request: &PredictionRequest,
        store: &dyn PredictionStore,
    ) -> Result<PredictionOutcome> {
        let (validated, predicted_sales, bundle) = self.run(request)?;

        let record = store.create(NewPrediction {
            store_id: validated.categorical(CategoricalField::StoreId).to_string(),
            product_id: validated.categorical(CategoricalField::ProductId).to_string(),
            category: validated.categorical(CategoricalField::Category).to_string(),
            region: validated.categorical(CategoricalField::Region).to_string(),
            date: validated.date(),
            predicted_sales,
            model_version: bundle.version.clone(),
        })?;

        info!(
            id = %record.id,
            version = %bundle.version,
            "predicted {:.3} units",
            predicted_sales
        );
        Ok(PredictionOutcome {
            predicted_sales,
            prediction_id: record.id,
            model_version: bundle.version.clone(),
        })
    }

    fn run(
        &self,
        request: &PredictionRequest,
    ) -> Result<(ValidatedRequest, f64, Arc<ArtifactBundle>)> {
        let validated = request.validate()?;
        let bundle = self.artifacts.get()?;

        let features = bundle.schema.encode(validated.record())?;
        let scaled = bundle
            .preprocessor
            .transform_row(features.as_slice())
            .map_err(structural)?;
        let prediction = bundle.model.predict_row(&scaled).map_err(structural)?;

        if !prediction.is_finite() {
            return Err(DemandError::SchemaMismatch(
                "Model produced a non-finite prediction".to_string(),
            ));
        }
        Ok((validated, prediction, bundle))
    }
}

/// Width disagreements between loaded parts are structural failures
fn structural(err: MathError) -> DemandError {
    match err {
        MathError::DimensionMismatch { expected, found } => DemandError::SchemaMismatch(format!(
            "Expected {} features, found {}",
            expected, found
        )),
        other => DemandError::Math(other),
    }
}
