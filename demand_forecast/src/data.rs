//! Historical sales records and the CSV loader that produces them

use crate::error::{DemandError, Result};
use crate::fields::{CategoricalField, NumericField, DATE_COLUMN, REQUIRED_COLUMNS, TARGET_COLUMN};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// One historical or incoming observation.
///
/// Every field is optional because training files may have gaps; inference
/// requests are validated into a fully populated record (minus the target).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: Option<NaiveDate>,
    pub store_id: Option<String>,
    pub product_id: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub inventory_level: Option<f64>,
    /// Training target, absent from inference requests
    pub units_sold: Option<f64>,
    pub units_ordered: Option<f64>,
    pub demand_forecast: Option<f64>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub weather_condition: Option<String>,
    pub holiday_promotion: Option<String>,
    pub competitor_pricing: Option<f64>,
    pub seasonality: Option<String>,
}

impl RawRecord {
    /// Value of a numeric field
    pub fn numeric(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::InventoryLevel => self.inventory_level,
            NumericField::UnitsOrdered => self.units_ordered,
            NumericField::DemandForecast => self.demand_forecast,
            NumericField::Price => self.price,
            NumericField::Discount => self.discount,
            NumericField::CompetitorPricing => self.competitor_pricing,
        }
    }

    /// Mutable slot of a numeric field
    pub fn numeric_mut(&mut self, field: NumericField) -> &mut Option<f64> {
        match field {
            NumericField::InventoryLevel => &mut self.inventory_level,
            NumericField::UnitsOrdered => &mut self.units_ordered,
            NumericField::DemandForecast => &mut self.demand_forecast,
            NumericField::Price => &mut self.price,
            NumericField::Discount => &mut self.discount,
            NumericField::CompetitorPricing => &mut self.competitor_pricing,
        }
    }

    /// Value of a categorical field
    pub fn categorical(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::StoreId => self.store_id.as_deref(),
            CategoricalField::ProductId => self.product_id.as_deref(),
            CategoricalField::Category => self.category.as_deref(),
            CategoricalField::Region => self.region.as_deref(),
            CategoricalField::WeatherCondition => self.weather_condition.as_deref(),
            CategoricalField::HolidayPromotion => self.holiday_promotion.as_deref(),
            CategoricalField::Seasonality => self.seasonality.as_deref(),
        }
    }

    /// Mutable slot of a categorical field
    pub fn categorical_mut(&mut self, field: CategoricalField) -> &mut Option<String> {
        match field {
            CategoricalField::StoreId => &mut self.store_id,
            CategoricalField::ProductId => &mut self.product_id,
            CategoricalField::Category => &mut self.category,
            CategoricalField::Region => &mut self.region,
            CategoricalField::WeatherCondition => &mut self.weather_condition,
            CategoricalField::HolidayPromotion => &mut self.holiday_promotion,
            CategoricalField::Seasonality => &mut self.seasonality,
        }
    }
}

/// Parse the date formats seen in retail exports
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

/// Mean of the non-missing values of a column, `None` when every value is missing
pub fn column_mean(name: &str, values: &[Option<f64>]) -> Option<f64> {
    Series::new(name, values).mean()
}

/// Reject inputs the schema builder cannot learn from
pub fn validate_training_records(records: &[RawRecord]) -> Result<()> {
    if records.is_empty() {
        return Err(DemandError::TrainingData(
            "Training set is empty".to_string(),
        ));
    }

    let mut absent = Vec::new();
    if records.iter().all(|r| r.date.is_none()) {
        absent.push(DATE_COLUMN);
    }
    if records.iter().all(|r| r.units_sold.is_none()) {
        absent.push(TARGET_COLUMN);
    }
    for field in NumericField::ALL {
        if records.iter().all(|r| r.numeric(field).is_none()) {
            absent.push(field.column());
        }
    }
    for field in CategoricalField::ALL {
        if records.iter().all(|r| r.categorical(field).is_none()) {
            absent.push(field.column());
        }
    }

    if !absent.is_empty() {
        return Err(DemandError::TrainingData(format!(
            "Required fields have no values: {}",
            absent.join(", ")
        )));
    }

    if let Some(position) = records.iter().position(|r| r.date.is_none()) {
        return Err(DemandError::TrainingData(format!(
            "Record {} has no date",
            position + 1
        )));
    }

    Ok(())
}

/// Data loader for historical sales files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load training records from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()
            .map_err(|e| {
                DemandError::TrainingData(format!("Failed to read {}: {}", path.display(), e))
            })?;

        info!(path = %path.display(), rows = df.height(), "loaded training file");
        Self::from_dataframe(&df)
    }

    /// Convert an existing DataFrame into validated training records
    pub fn from_dataframe(df: &DataFrame) -> Result<Vec<RawRecord>> {
        let names = df.get_column_names();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|required| !names.contains(required))
            .collect();
        if !missing.is_empty() {
            return Err(DemandError::TrainingData(format!(
                "Missing required columns: {}",
                missing.join(", ")
            )));
        }

        let height = df.height();
        let mut records = vec![RawRecord::default(); height];

        let dates = Self::text_column(df, DATE_COLUMN)?;
        for (row, (record, raw)) in records.iter_mut().zip(dates).enumerate() {
            if let Some(raw) = raw {
                let date = parse_date(&raw).ok_or_else(|| {
                    DemandError::TrainingData(format!(
                        "Unparseable date '{}' on row {}",
                        raw,
                        row + 1
                    ))
                })?;
                record.date = Some(date);
            }
        }

        for (record, value) in records.iter_mut().zip(Self::numeric_column(df, TARGET_COLUMN)?) {
            record.units_sold = value;
        }

        for field in NumericField::ALL {
            let values = Self::numeric_column(df, field.column())?;
            for (record, value) in records.iter_mut().zip(values) {
                *record.numeric_mut(field) = value;
            }
        }

        for field in CategoricalField::ALL {
            let values = Self::text_column(df, field.column())?;
            for (record, value) in records.iter_mut().zip(values) {
                *record.categorical_mut(field) = value.map(|v| field.normalize(&v));
            }
        }

        debug!(records = records.len(), "converted training frame");
        validate_training_records(&records)?;
        Ok(records)
    }

    /// Read a column as floats, failing on values that are present but not numeric
    fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let series = df.column(name)?;
        let cast = series.cast(&DataType::Float64)?;
        if cast.null_count() != series.null_count() {
            return Err(DemandError::TrainingData(format!(
                "Column '{}' contains non-numeric values",
                name
            )));
        }
        Ok(cast.f64()?.into_iter().collect())
    }

    /// Read a column as trimmed text; blank cells count as missing
    fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        let cast = df.column(name)?.cast(&DataType::Utf8)?;
        Ok(cast
            .utf8()?
            .into_iter()
            .map(|value| {
                value
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
            .collect())
    }
}
