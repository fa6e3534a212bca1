//! The raw field vocabulary shared by training files and API requests
//!
//! Training CSVs use human-readable column names ("Store ID") while API
//! requests use snake_case ("store_id"). Every mapping between the two lives
//! here so both sides of the pipeline resolve names the same way.

use serde::{Deserialize, Serialize};

/// CSV column holding the observation date
pub const DATE_COLUMN: &str = "Date";

/// CSV column holding the training target
pub const TARGET_COLUMN: &str = "Units Sold";

/// Every column a training file must provide, in file order
pub const REQUIRED_COLUMNS: [&str; 15] = [
    "Date",
    "Store ID",
    "Product ID",
    "Category",
    "Region",
    "Inventory Level",
    "Units Sold",
    "Units Ordered",
    "Demand Forecast",
    "Price",
    "Discount",
    "Weather Condition",
    "Holiday/Promotion",
    "Competitor Pricing",
    "Seasonality",
];

/// Numeric input fields (the target is handled separately)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumericField {
    InventoryLevel,
    UnitsOrdered,
    DemandForecast,
    Price,
    Discount,
    CompetitorPricing,
}

impl NumericField {
    /// All numeric fields in training-file order
    pub const ALL: [NumericField; 6] = [
        NumericField::InventoryLevel,
        NumericField::UnitsOrdered,
        NumericField::DemandForecast,
        NumericField::Price,
        NumericField::Discount,
        NumericField::CompetitorPricing,
    ];

    /// Column name in the training vocabulary
    pub fn column(self) -> &'static str {
        match self {
            NumericField::InventoryLevel => "Inventory Level",
            NumericField::UnitsOrdered => "Units Ordered",
            NumericField::DemandForecast => "Demand Forecast",
            NumericField::Price => "Price",
            NumericField::Discount => "Discount",
            NumericField::CompetitorPricing => "Competitor Pricing",
        }
    }

    /// Field name in the request vocabulary
    pub fn request_name(self) -> &'static str {
        match self {
            NumericField::InventoryLevel => "inventory_level",
            NumericField::UnitsOrdered => "units_ordered",
            NumericField::DemandForecast => "demand_forecast",
            NumericField::Price => "price",
            NumericField::Discount => "discount",
            NumericField::CompetitorPricing => "competitor_pricing",
        }
    }
}

/// Categorical input fields, expanded into indicator columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoricalField {
    StoreId,
    ProductId,
    Category,
    Region,
    WeatherCondition,
    HolidayPromotion,
    Seasonality,
}

impl CategoricalField {
    /// All categorical fields in encoding order
    pub const ALL: [CategoricalField; 7] = [
        CategoricalField::StoreId,
        CategoricalField::ProductId,
        CategoricalField::Category,
        CategoricalField::Region,
        CategoricalField::WeatherCondition,
        CategoricalField::HolidayPromotion,
        CategoricalField::Seasonality,
    ];

    /// Column name in the training vocabulary
    pub fn column(self) -> &'static str {
        match self {
            CategoricalField::StoreId => "Store ID",
            CategoricalField::ProductId => "Product ID",
            CategoricalField::Category => "Category",
            CategoricalField::Region => "Region",
            CategoricalField::WeatherCondition => "Weather Condition",
            CategoricalField::HolidayPromotion => "Holiday/Promotion",
            CategoricalField::Seasonality => "Seasonality",
        }
    }

    /// Field name in the request vocabulary
    pub fn request_name(self) -> &'static str {
        match self {
            CategoricalField::StoreId => "store_id",
            CategoricalField::ProductId => "product_id",
            CategoricalField::Category => "category",
            CategoricalField::Region => "region",
            CategoricalField::WeatherCondition => "weather_condition",
            CategoricalField::HolidayPromotion => "holiday_promotion",
            CategoricalField::Seasonality => "seasonality",
        }
    }

    /// Bring a raw value into the training vocabulary
    pub fn normalize(self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self {
            CategoricalField::HolidayPromotion => normalize_flag(trimmed),
            _ => integral_text(trimmed).unwrap_or(trimmed).to_string(),
        }
    }
}

/// Float-formatted whole numbers ("1.0", "12.00") lose their zero fraction
/// so float-typed CSV columns and integer request values name one level.
fn integral_text(raw: &str) -> Option<&str> {
    let (whole, fraction) = raw.split_once('.')?;
    let digits = whole.strip_prefix('-').unwrap_or(whole);
    let is_whole = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !fraction.is_empty()
        && fraction.bytes().all(|b| b == b'0');
    is_whole.then_some(whole)
}

/// Holiday/promotion flags arrive as 0/1 in training files but as
/// "yes(1)" / "false(0)", booleans or numbers from clients.
fn normalize_flag(raw: &str) -> String {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" | "y" | "yes(1)" | "true(1)" => "1".to_string(),
        "0" | "0.0" | "false" | "no" | "n" | "no(0)" | "false(0)" => "0".to_string(),
        _ => raw.to_string(),
    }
}
