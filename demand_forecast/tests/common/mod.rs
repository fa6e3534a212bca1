#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use demand_forecast::fields::REQUIRED_COLUMNS;
use demand_forecast::{PredictionRequest, RawRecord};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

const PRODUCTS: [&str; 3] = ["P1", "P2", "P3"];
const CATEGORIES: [&str; 2] = ["Groceries", "Toys"];
const REGIONS: [&str; 2] = ["North", "South"];
const WEATHER: [&str; 3] = ["Cloudy", "Rainy", "Sunny"];
const SEASONS: [&str; 2] = ["Summer", "Winter"];

/// Deterministic records over stores S1 and S2 with a mostly linear target
pub fn sample_records(n: usize) -> Vec<RawRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let demand = 50.0 + (i % 17) as f64 * 3.0;
            let price = 10.0 + (i % 5) as f64 * 2.5;
            let discount = ((i % 4) * 5) as f64;
            RawRecord {
                date: Some(start + Duration::days(i as i64)),
                store_id: Some(if i % 2 == 0 { "S1" } else { "S2" }.to_string()),
                product_id: Some(PRODUCTS[i % 3].to_string()),
                category: Some(CATEGORIES[i % 2].to_string()),
                region: Some(REGIONS[(i / 2) % 2].to_string()),
                inventory_level: Some(200.0 + (i % 11) as f64 * 10.0),
                units_sold: Some(0.8 * demand - 1.5 * price + 0.3 * discount + (i % 3) as f64),
                units_ordered: Some(40.0 + (i % 7) as f64 * 5.0),
                demand_forecast: Some(demand),
                price: Some(price),
                discount: Some(discount),
                weather_condition: Some(WEATHER[i % 3].to_string()),
                holiday_promotion: Some((i % 2).to_string()),
                competitor_pricing: Some(price + 1.0 + (i % 3) as f64 * 0.5),
                seasonality: Some(SEASONS[(i / 10) % 2].to_string()),
            }
        })
        .collect()
}

fn cell_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn cell_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write records as a training CSV with the standard header
pub fn write_csv(records: &[RawRecord]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", REQUIRED_COLUMNS.join(",")).unwrap();
    for r in records {
        let row = [
            r.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            cell_text(&r.store_id),
            cell_text(&r.product_id),
            cell_text(&r.category),
            cell_text(&r.region),
            cell_number(r.inventory_level),
            cell_number(r.units_sold),
            cell_number(r.units_ordered),
            cell_number(r.demand_forecast),
            cell_number(r.price),
            cell_number(r.discount),
            cell_text(&r.weather_condition),
            cell_text(&r.holiday_promotion),
            cell_number(r.competitor_pricing),
            cell_text(&r.seasonality),
        ];
        writeln!(file, "{}", row.join(",")).unwrap();
    }
    file.flush().unwrap();
    file
}

/// A valid request for `store_id`
pub fn sample_request(store_id: &str) -> PredictionRequest {
    serde_json::from_value(json!({
        "store_id": store_id,
        "product_id": "P2",
        "category": "Toys",
        "region": "North",
        "date": "2024-03-15",
        "inventory_level": 250,
        "units_ordered": 55,
        "demand_forecast": 80.0,
        "price": 15.0,
        "discount": 10,
        "weather_condition": "Sunny",
        "holiday_promotion": 1,
        "competitor_pricing": 16.5,
        "seasonality": "Winter"
    }))
    .unwrap()
}
