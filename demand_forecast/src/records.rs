//! Prediction records and the store they are kept in

use crate::error::{DemandError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use uuid::Uuid;

/// Number of groups reported per breakdown in [`PredictionStats`]
pub const TOP_GROUPS: usize = 5;

/// One served prediction, optionally reconciled with the actual outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub store_id: String,
    pub product_id: String,
    pub category: String,
    pub region: String,
    pub date: NaiveDate,
    pub predicted_sales: f64,
    pub actual_sales: Option<f64>,
    /// Artifact version that produced the prediction
    pub model_version: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when recording a prediction
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub store_id: String,
    pub product_id: String,
    pub category: String,
    pub region: String,
    pub date: NaiveDate,
    pub predicted_sales: f64,
    pub model_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub count: usize,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTotal {
    pub region: String,
    pub count: usize,
    pub total_sales: f64,
}

/// Aggregates over the stored predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionStats {
    pub prediction_count: usize,
    pub avg_predicted_sales: Option<f64>,
    /// Average over the predictions with a recorded actual value
    pub avg_actual_sales: Option<f64>,
    /// Categories by total predicted sales, highest first
    pub top_categories: Vec<CategoryTotal>,
    /// Regions by total predicted sales, highest first
    pub top_regions: Vec<RegionTotal>,
}

impl PredictionStats {
    pub fn from_records(records: &[PredictionRecord]) -> Self {
        let count = records.len();
        let avg_predicted_sales = mean(records.iter().map(|r| r.predicted_sales));
        let avg_actual_sales = mean(records.iter().filter_map(|r| r.actual_sales));

        let top_categories = top_groups(records, |r| &r.category)
            .into_iter()
            .map(|(category, count, total_sales)| CategoryTotal {
                category,
                count,
                total_sales,
            })
            .collect();
        let top_regions = top_groups(records, |r| &r.region)
            .into_iter()
            .map(|(region, count, total_sales)| RegionTotal {
                region,
                count,
                total_sales,
            })
            .collect();

        Self {
            prediction_count: count,
            avg_predicted_sales,
            avg_actual_sales,
            top_categories,
            top_regions,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn top_groups<F>(records: &[PredictionRecord], key: F) -> Vec<(String, usize, f64)>
where
    F: Fn(&PredictionRecord) -> &String,
{
    let mut groups: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for record in records {
        let entry = groups.entry(key(record).as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.predicted_sales;
    }

    let mut groups: Vec<(String, usize, f64)> = groups
        .into_iter()
        .map(|(k, (n, total))| (k.to_string(), n, total))
        .collect();
    // Stable sort keeps ties in name order
    groups.sort_by(|a, b| b.2.total_cmp(&a.2));
    groups.truncate(TOP_GROUPS);
    groups
}

/// Persistence seam for prediction records
pub trait PredictionStore: Send + Sync {
    /// Record a new prediction
    fn create(&self, prediction: NewPrediction) -> Result<PredictionRecord>;

    /// Fetch one record
    fn get(&self, id: Uuid) -> Result<PredictionRecord>;

    /// All records, newest date first, then by store and product
    fn list(&self) -> Result<Vec<PredictionRecord>>;

    /// Attach the observed sales to a record
    fn set_actual(&self, id: Uuid, actual_sales: f64) -> Result<PredictionRecord>;

    /// Aggregate statistics over every record
    fn stats(&self) -> Result<PredictionStats> {
        Ok(PredictionStats::from_records(&self.list()?))
    }
}

/// In-process store backed by a hash map
#[derive(Debug, Default)]
pub struct MemoryPredictionStore {
    records: RwLock<HashMap<Uuid, PredictionRecord>>,
}

impl MemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl PredictionStore for MemoryPredictionStore {
    fn create(&self, prediction: NewPrediction) -> Result<PredictionRecord> {
        if !prediction.predicted_sales.is_finite() {
            return Err(DemandError::Store(
                "Predicted sales must be finite".to_string(),
            ));
        }

        let record = PredictionRecord {
            id: Uuid::new_v4(),
            store_id: prediction.store_id,
            product_id: prediction.product_id,
            category: prediction.category,
            region: prediction.region,
            date: prediction.date,
            predicted_sales: prediction.predicted_sales,
            actual_sales: None,
            model_version: prediction.model_version,
            created_at: Utc::now(),
        };
        self.records.write().insert(record.id, record.clone());
        debug!(id = %record.id, "stored prediction");
        Ok(record)
    }

    fn get(&self, id: Uuid) -> Result<PredictionRecord> {
        self.records
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| DemandError::NotFound(format!("Prediction {} does not exist", id)))
    }

    fn list(&self) -> Result<Vec<PredictionRecord>> {
        let mut records: Vec<PredictionRecord> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| a.store_id.cmp(&b.store_id))
                .then_with(|| a.product_id.cmp(&b.product_id))
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(records)
    }

    fn set_actual(&self, id: Uuid, actual_sales: f64) -> Result<PredictionRecord> {
        if !actual_sales.is_finite() || actual_sales < 0.0 {
            return Err(DemandError::Validation(
                "actual_sales must be a finite, non-negative number".to_string(),
            ));
        }

        let mut records = self.records.write();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| DemandError::NotFound(format!("Prediction {} does not exist", id)))?;
        record.actual_sales = Some(actual_sales);
        debug!(id = %id, actual_sales, "recorded actual sales");
        Ok(record.clone())
    }
}
