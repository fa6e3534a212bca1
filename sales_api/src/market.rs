//! Historical market data: storage, CSV import and seasonal aggregates

use chrono::NaiveDate;
use demand_forecast::data::parse_date;
use demand_forecast::{CategoricalField, DemandError, FieldValue, NumericField, RawRecord, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// One stored historical observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub id: u64,
    pub date: NaiveDate,
    pub store_id: String,
    pub product_id: String,
    pub category: String,
    pub region: String,
    pub inventory_level: f64,
    pub units_sold: f64,
    pub units_ordered: f64,
    pub demand_forecast: f64,
    pub price: f64,
    pub discount: f64,
    pub weather_condition: String,
    pub holiday_promotion: String,
    pub competitor_pricing: f64,
    pub seasonality: String,
}

impl MarketData {
    /// Build a row from a record; every field, including units sold, is required
    fn from_record(id: u64, record: &RawRecord) -> std::result::Result<Self, String> {
        let mut missing = Vec::new();

        let text = |field: CategoricalField, missing: &mut Vec<&'static str>| {
            record
                .categorical(field)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    missing.push(field.request_name());
                    String::new()
                })
        };
        let number = |field: NumericField, missing: &mut Vec<&'static str>| {
            record.numeric(field).unwrap_or_else(|| {
                missing.push(field.request_name());
                0.0
            })
        };

        let store_id = text(CategoricalField::StoreId, &mut missing);
        let product_id = text(CategoricalField::ProductId, &mut missing);
        let category = text(CategoricalField::Category, &mut missing);
        let region = text(CategoricalField::Region, &mut missing);
        let weather_condition = text(CategoricalField::WeatherCondition, &mut missing);
        let holiday_promotion = text(CategoricalField::HolidayPromotion, &mut missing);
        let seasonality = text(CategoricalField::Seasonality, &mut missing);
        let inventory_level = number(NumericField::InventoryLevel, &mut missing);
        let units_ordered = number(NumericField::UnitsOrdered, &mut missing);
        let demand_forecast = number(NumericField::DemandForecast, &mut missing);
        let price = number(NumericField::Price, &mut missing);
        let discount = number(NumericField::Discount, &mut missing);
        let competitor_pricing = number(NumericField::CompetitorPricing, &mut missing);
        if record.units_sold.is_none() {
            missing.push("units_sold");
        }
        if record.date.is_none() {
            missing.push("date");
        }

        let (Some(date), Some(units_sold)) = (record.date, record.units_sold) else {
            return Err(format!("missing {}", missing.join(", ")));
        };
        if !missing.is_empty() {
            return Err(format!("missing {}", missing.join(", ")));
        }

        let numbers = [
            ("units_sold", units_sold),
            ("inventory_level", inventory_level),
            ("units_ordered", units_ordered),
            ("demand_forecast", demand_forecast),
            ("price", price),
            ("discount", discount),
            ("competitor_pricing", competitor_pricing),
        ];
        if let Some((name, _)) = numbers.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(format!("{} must be a finite, non-negative number", name));
        }

        Ok(Self {
            id,
            date,
            store_id,
            product_id,
            category,
            region,
            inventory_level,
            units_sold,
            units_ordered,
            demand_forecast,
            price,
            discount,
            weather_condition,
            holiday_promotion,
            competitor_pricing,
            seasonality,
        })
    }
}

/// JSON body of `POST /api/market-data/`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarketDataInput {
    pub date: Option<String>,
    pub store_id: Option<FieldValue>,
    pub product_id: Option<FieldValue>,
    pub category: Option<FieldValue>,
    pub region: Option<FieldValue>,
    pub inventory_level: Option<f64>,
    pub units_sold: Option<f64>,
    pub units_ordered: Option<f64>,
    pub demand_forecast: Option<f64>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub weather_condition: Option<FieldValue>,
    pub holiday_promotion: Option<FieldValue>,
    pub competitor_pricing: Option<f64>,
    pub seasonality: Option<FieldValue>,
}

impl MarketDataInput {
    fn into_record(self) -> std::result::Result<RawRecord, String> {
        let date = match self.date {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|_| format!("date '{}' is not an ISO date (YYYY-MM-DD)", raw))?,
            ),
            None => None,
        };
        let text = |value: Option<FieldValue>, field: CategoricalField| {
            value
                .map(|v| field.normalize(&v.as_text()))
                .filter(|v| !v.is_empty())
        };

        Ok(RawRecord {
            date,
            store_id: text(self.store_id, CategoricalField::StoreId),
            product_id: text(self.product_id, CategoricalField::ProductId),
            category: text(self.category, CategoricalField::Category),
            region: text(self.region, CategoricalField::Region),
            inventory_level: self.inventory_level,
            units_sold: self.units_sold,
            units_ordered: self.units_ordered,
            demand_forecast: self.demand_forecast,
            price: self.price,
            discount: self.discount,
            weather_condition: text(self.weather_condition, CategoricalField::WeatherCondition),
            holiday_promotion: text(self.holiday_promotion, CategoricalField::HolidayPromotion),
            competitor_pricing: self.competitor_pricing,
            seasonality: text(self.seasonality, CategoricalField::Seasonality),
        })
    }
}

/// One row of a training-format CSV
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "Store ID")]
    store_id: Option<String>,
    #[serde(rename = "Product ID")]
    product_id: Option<String>,
    #[serde(rename = "Category")]
    category: Option<String>,
    #[serde(rename = "Region")]
    region: Option<String>,
    #[serde(rename = "Inventory Level")]
    inventory_level: Option<f64>,
    #[serde(rename = "Units Sold")]
    units_sold: Option<f64>,
    #[serde(rename = "Units Ordered")]
    units_ordered: Option<f64>,
    #[serde(rename = "Demand Forecast")]
    demand_forecast: Option<f64>,
    #[serde(rename = "Price")]
    price: Option<f64>,
    #[serde(rename = "Discount")]
    discount: Option<f64>,
    #[serde(rename = "Weather Condition")]
    weather_condition: Option<String>,
    #[serde(rename = "Holiday/Promotion")]
    holiday_promotion: Option<String>,
    #[serde(rename = "Competitor Pricing")]
    competitor_pricing: Option<f64>,
    #[serde(rename = "Seasonality")]
    seasonality: Option<String>,
}

impl CsvRow {
    fn into_record(self) -> std::result::Result<RawRecord, String> {
        let date = match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => Some(parse_date(raw).ok_or_else(|| format!("unparseable date '{}'", raw))?),
            None => None,
        };
        let text = |value: Option<String>, field: CategoricalField| {
            value
                .map(|v| field.normalize(&v))
                .filter(|v| !v.is_empty())
        };

        Ok(RawRecord {
            date,
            store_id: text(self.store_id, CategoricalField::StoreId),
            product_id: text(self.product_id, CategoricalField::ProductId),
            category: text(self.category, CategoricalField::Category),
            region: text(self.region, CategoricalField::Region),
            inventory_level: self.inventory_level,
            units_sold: self.units_sold,
            units_ordered: self.units_ordered,
            demand_forecast: self.demand_forecast,
            price: self.price,
            discount: self.discount,
            weather_condition: text(self.weather_condition, CategoricalField::WeatherCondition),
            holiday_promotion: text(self.holiday_promotion, CategoricalField::HolidayPromotion),
            competitor_pricing: self.competitor_pricing,
            seasonality: text(self.seasonality, CategoricalField::Seasonality),
        })
    }
}

/// Average and total units sold for one (category, seasonality) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalSummary {
    pub category: String,
    pub seasonality: String,
    pub count: usize,
    pub avg_units_sold: f64,
    pub total_units_sold: f64,
}

/// Outcome of a CSV import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct Rows {
    rows: Vec<MarketData>,
    next_id: u64,
}

/// In-memory market data table
#[derive(Debug, Default)]
pub struct MarketDataStore {
    inner: RwLock<Rows>,
}

impl MarketDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().rows.is_empty()
    }

    /// Validate and store one row from the API
    pub fn insert(&self, input: MarketDataInput) -> Result<MarketData> {
        let record = input.into_record().map_err(DemandError::Validation)?;
        let mut inner = self.inner.write();
        let row = MarketData::from_record(inner.next_id + 1, &record).map_err(DemandError::Validation)?;
        inner.next_id += 1;
        inner.rows.push(row.clone());
        Ok(row)
    }

    /// Store a batch of records; invalid rows are skipped and counted
    pub fn insert_batch(&self, records: &[RawRecord]) -> ImportSummary {
        let mut summary = ImportSummary::default();
        let mut inner = self.inner.write();
        for record in records {
            match MarketData::from_record(inner.next_id + 1, record) {
                Ok(row) => {
                    inner.next_id += 1;
                    inner.rows.push(row);
                    summary.imported += 1;
                }
                Err(reason) => {
                    warn!("Skipping market data row: {}", reason);
                    summary.skipped += 1;
                }
            }
        }
        summary
    }

    /// Rows newest first, then by store and product, at most `limit` of them
    pub fn list(&self, limit: Option<usize>) -> Vec<MarketData> {
        let mut rows = self.inner.read().rows.clone();
        rows.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| a.store_id.cmp(&b.store_id))
                .then_with(|| a.product_id.cmp(&b.product_id))
                .then_with(|| a.id.cmp(&b.id))
        });
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        rows
    }

    /// Units sold per (category, seasonality), sorted by both keys
    pub fn seasonal_analysis(&self) -> Vec<SeasonalSummary> {
        let inner = self.inner.read();
        let mut groups: BTreeMap<(&str, &str), (usize, f64)> = BTreeMap::new();
        for row in &inner.rows {
            let entry = groups
                .entry((row.category.as_str(), row.seasonality.as_str()))
                .or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += row.units_sold;
        }

        groups
            .into_iter()
            .map(|((category, seasonality), (count, total))| SeasonalSummary {
                category: category.to_string(),
                seasonality: seasonality.to_string(),
                count,
                avg_units_sold: total / count as f64,
                total_units_sold: total,
            })
            .collect()
    }

    /// Import a training-format CSV in batches of `batch_size` rows
    pub fn import_csv(&self, path: &Path, batch_size: usize) -> Result<ImportSummary> {
        let batch_size = batch_size.max(1);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DemandError::TrainingData(format!("Failed to open {:?}: {}", path, e)))?;
        info!("Importing market data from {:?}", path);

        let mut summary = ImportSummary::default();
        let mut batch = Vec::with_capacity(batch_size);
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let parsed = row
                .map_err(|e| e.to_string())
                .and_then(CsvRow::into_record);
            match parsed {
                Ok(record) => batch.push(record),
                Err(reason) => {
                    warn!("Skipping CSV row {}: {}", line + 2, reason);
                    summary.skipped += 1;
                }
            }

            if batch.len() == batch_size {
                let done = self.insert_batch(&batch);
                summary.imported += done.imported;
                summary.skipped += done.skipped;
                batch.clear();
                info!("Imported {} rows", summary.imported);
            }
        }
        if !batch.is_empty() {
            let done = self.insert_batch(&batch);
            summary.imported += done.imported;
            summary.skipped += done.skipped;
        }

        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            "market data import completed"
        );
        Ok(summary)
    }
}
