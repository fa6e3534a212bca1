//! Typed inference requests and their validation

use crate::data::RawRecord;
use crate::error::{DemandError, Result};
use crate::fields::{CategoricalField, NumericField};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Largest magnitude at which whole numbers are rendered without a fraction
const INTEGER_RENDER_LIMIT: f64 = 1e15;

/// A JSON scalar as sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Text form of the value; whole numbers render without a fraction so
    /// `1` and `"1"` name the same level.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.trim().to_string(),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < INTEGER_RENDER_LIMIT => {
                format!("{}", *n as i64)
            }
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Flag(b) => b.to_string(),
        }
    }

    /// Numeric form of the value; numeric strings are accepted
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Flag(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// Prediction request body in the request vocabulary.
///
/// Every field is optional at the type level so that a request with several
/// problems reports all of them in one validation error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionRequest {
    pub store_id: Option<FieldValue>,
    pub product_id: Option<FieldValue>,
    pub category: Option<FieldValue>,
    pub region: Option<FieldValue>,
    pub date: Option<FieldValue>,
    pub inventory_level: Option<FieldValue>,
    pub units_ordered: Option<FieldValue>,
    pub demand_forecast: Option<FieldValue>,
    pub price: Option<FieldValue>,
    pub discount: Option<FieldValue>,
    pub weather_condition: Option<FieldValue>,
    pub holiday_promotion: Option<FieldValue>,
    pub competitor_pricing: Option<FieldValue>,
    pub seasonality: Option<FieldValue>,
}

/// A request that passed validation, as a fully populated record
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    record: RawRecord,
    date: NaiveDate,
}

impl ValidatedRequest {
    pub fn record(&self) -> &RawRecord {
        &self.record
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Normalized value of a categorical field
    pub fn categorical(&self, field: CategoricalField) -> &str {
        self.record.categorical(field).unwrap_or_default()
    }

    pub fn numeric(&self, field: NumericField) -> f64 {
        self.record.numeric(field).unwrap_or_default()
    }
}

impl PredictionRequest {
    /// Parse a JSON body; malformed JSON is a validation error
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| DemandError::Validation(format!("Invalid request body: {}", e)))
    }

    fn numeric_value(&self, field: NumericField) -> Option<&FieldValue> {
        match field {
            NumericField::InventoryLevel => self.inventory_level.as_ref(),
            NumericField::UnitsOrdered => self.units_ordered.as_ref(),
            NumericField::DemandForecast => self.demand_forecast.as_ref(),
            NumericField::Price => self.price.as_ref(),
            NumericField::Discount => self.discount.as_ref(),
            NumericField::CompetitorPricing => self.competitor_pricing.as_ref(),
        }
    }

    fn categorical_value(&self, field: CategoricalField) -> Option<&FieldValue> {
        match field {
            CategoricalField::StoreId => self.store_id.as_ref(),
            CategoricalField::ProductId => self.product_id.as_ref(),
            CategoricalField::Category => self.category.as_ref(),
            CategoricalField::Region => self.region.as_ref(),
            CategoricalField::WeatherCondition => self.weather_condition.as_ref(),
            CategoricalField::HolidayPromotion => self.holiday_promotion.as_ref(),
            CategoricalField::Seasonality => self.seasonality.as_ref(),
        }
    }

    /// Check every field and convert the request into a record.
    ///
    /// Quantities and prices must be finite and non-negative, the discount a
    /// percentage in `0..=100`, the date ISO `YYYY-MM-DD`, and text fields
    /// non-empty.
    pub fn validate(&self) -> Result<ValidatedRequest> {
        let mut problems = Vec::new();
        let mut record = RawRecord::default();

        let date = match &self.date {
            None => {
                problems.push("date is required".to_string());
                None
            }
            Some(FieldValue::Text(raw)) => {
                match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                    Ok(date) => Some(date),
                    Err(_) => {
                        problems.push(format!("date '{}' is not an ISO date (YYYY-MM-DD)", raw));
                        None
                    }
                }
            }
            Some(_) => {
                problems.push("date must be a string".to_string());
                None
            }
        };
        record.date = date;

        for field in NumericField::ALL {
            let name = field.request_name();
            match self.numeric_value(field).map(|v| (v, v.as_number())) {
                None => problems.push(format!("{} is required", name)),
                Some((raw, None)) => {
                    problems.push(format!("{} must be a number, got {}", name, raw.as_text()))
                }
                Some((_, Some(v))) if !v.is_finite() => {
                    problems.push(format!("{} must be finite", name))
                }
                Some((_, Some(v))) if v < 0.0 => {
                    problems.push(format!("{} must not be negative", name))
                }
                Some((_, Some(v))) if field == NumericField::Discount && v > 100.0 => {
                    problems.push(format!("{} must be between 0 and 100", name))
                }
                Some((_, Some(v))) => *record.numeric_mut(field) = Some(v),
            }
        }

        for field in CategoricalField::ALL {
            let name = field.request_name();
            match self.categorical_value(field).map(FieldValue::as_text) {
                None => problems.push(format!("{} is required", name)),
                Some(text) if text.is_empty() => {
                    problems.push(format!("{} must not be empty", name))
                }
                Some(text) => *record.categorical_mut(field) = Some(field.normalize(&text)),
            }
        }

        match date {
            Some(date) if problems.is_empty() => Ok(ValidatedRequest { record, date }),
            _ => Err(DemandError::Validation(problems.join("; "))),
        }
    }
}
