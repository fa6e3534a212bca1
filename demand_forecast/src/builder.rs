//! Schema builder: turns historical records into a trained bundle
//!
//! The builder splits the raw records first and fits every learned piece
//! (imputation, category levels, scaler, regressor) on the training
//! partition only. Both partitions are encoded through
//! [`FeatureSchema::encode`], the same path the inference adapter uses.

use crate::data::{validate_training_records, RawRecord};
use crate::error::{DemandError, Result};
use crate::schema::{EncodingOptions, FeatureSchema};
use crate::utils::train_test_split;
use demand_math::{
    LeastSquares, LinearModel, RegressionMetrics, Regressor, Ridge, StandardScaler, TrainedRegressor,
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Settings of one builder run
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderConfig {
    /// Share of records held out for evaluation
    pub eval_ratio: f64,
    /// Seed of the evaluation split
    pub seed: u64,
    /// Ridge penalties tried after ordinary least squares
    pub ridge_alphas: Vec<f64>,
    pub encoding: EncodingOptions,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            eval_ratio: 0.2,
            seed: 42,
            ridge_alphas: vec![1.0, 10.0],
            encoding: EncodingOptions::default(),
        }
    }
}

/// Evaluation score of one candidate regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub name: String,
    pub r2: f64,
}

/// What happened during a builder run; persisted in the bundle manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Candidates in evaluation order
    pub candidates: Vec<CandidateScore>,
    pub selected: String,
    pub train_r2: f64,
    pub evaluation: RegressionMetrics,
    pub train_rows: usize,
    pub eval_rows: usize,
    pub seed: u64,
    pub eval_ratio: f64,
}

/// Model, preprocessor and schema produced together by one run
#[derive(Debug, Clone)]
pub struct TrainedBundle {
    pub schema: FeatureSchema,
    pub preprocessor: StandardScaler,
    pub model: LinearModel,
    pub report: TrainingReport,
}

/// Fits the feature schema, scaler and regressor from raw records
#[derive(Debug)]
pub struct SchemaBuilder {
    config: BuilderConfig,
    candidates: Vec<Box<dyn Regressor>>,
}

impl SchemaBuilder {
    /// Builder with the default candidates: least squares, then one ridge
    /// model per configured alpha.
    pub fn new(config: BuilderConfig) -> Result<Self> {
        let mut candidates: Vec<Box<dyn Regressor>> = vec![Box::new(LeastSquares::new())];
        for &alpha in &config.ridge_alphas {
            candidates.push(Box::new(Ridge::new(alpha)?));
        }
        Ok(Self { config, candidates })
    }

    /// Replace the candidate list; evaluation order is list order
    pub fn with_candidates(mut self, candidates: Vec<Box<dyn Regressor>>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Run the full pipeline over `records`.
    pub fn build(&self, records: &[RawRecord]) -> Result<TrainedBundle> {
        if self.candidates.is_empty() {
            return Err(DemandError::Config(
                "At least one candidate regressor is required".to_string(),
            ));
        }

        validate_training_records(records)?;

        let (train_idx, eval_idx) =
            train_test_split(records.len(), self.config.eval_ratio, self.config.seed)?;
        info!(
            "Split {} records into {} training and {} evaluation rows (seed {})",
            records.len(),
            train_idx.len(),
            eval_idx.len(),
            self.config.seed
        );

        let train: Vec<&RawRecord> = train_idx.iter().map(|&i| &records[i]).collect();
        let eval: Vec<&RawRecord> = eval_idx.iter().map(|&i| &records[i]).collect();

        let schema = FeatureSchema::fit(&train, self.config.encoding)?;
        debug!("Feature schema has {} columns", schema.len());

        let (x_train, y_train) = encode_partition(&schema, &train)?;
        let (x_eval, y_eval) = encode_partition(&schema, &eval)?;

        let preprocessor = StandardScaler::fit(&x_train)?;
        let x_train = preprocessor.transform(&x_train)?;
        let x_eval = preprocessor.transform(&x_eval)?;

        let mut models = Vec::with_capacity(self.candidates.len());
        let mut scores = Vec::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            let model = candidate.fit(&x_train, &y_train)?;
            let r2 = model.score(&x_eval, &y_eval)?;
            info!("Candidate {} evaluation R2: {:.4}", candidate.name(), r2);
            if r2.is_nan() {
                warn!("Candidate {} produced a NaN score", candidate.name());
            }
            scores.push(CandidateScore {
                name: candidate.name().to_string(),
                r2,
            });
            models.push(model);
        }

        let r2s: Vec<f64> = scores.iter().map(|s| s.r2).collect();
        let best = select_candidate(&r2s).ok_or_else(|| {
            DemandError::TrainingData("No candidate regressor was evaluated".to_string())
        })?;
        let model = models.swap_remove(best);

        let train_r2 = model.score(&x_train, &y_train)?;
        let predicted = model.predict(&x_eval)?;
        let evaluation = RegressionMetrics::evaluate(&y_eval.to_vec(), &predicted.to_vec())?;
        info!(
            "Selected {} (train R2 {:.4}, evaluation {})",
            model.name(),
            train_r2,
            evaluation
        );

        let report = TrainingReport {
            candidates: scores,
            selected: model.name().to_string(),
            train_r2,
            evaluation,
            train_rows: train.len(),
            eval_rows: eval.len(),
            seed: self.config.seed,
            eval_ratio: self.config.eval_ratio,
        };

        Ok(TrainedBundle {
            schema,
            preprocessor,
            model,
            report,
        })
    }
}

/// Index of the best score. NaN ranks below every number and ties keep the
/// earlier candidate.
pub fn select_candidate(scores: &[f64]) -> Option<usize> {
    let rank = |s: f64| if s.is_nan() { f64::NEG_INFINITY } else { s };
    let mut best: Option<usize> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some(b) if rank(score) <= rank(scores[b]) => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Encode records into a design matrix and target vector
pub fn encode_partition(
    schema: &FeatureSchema,
    records: &[&RawRecord],
) -> Result<(Array2<f64>, Array1<f64>)> {
    let width = schema.len();
    let mut values = Vec::with_capacity(records.len() * width);
    let mut targets = Vec::with_capacity(records.len());

    for record in records {
        let row = schema.encode(record)?;
        values.extend(row.into_inner());
        targets.push(schema.target(record));
    }

    let x = Array2::from_shape_vec((records.len(), width), values)
        .map_err(|e| DemandError::SchemaMismatch(format!("Failed to shape feature matrix: {}", e)))?;
    Ok((x, Array1::from(targets)))
}
