mod common;

use demand_forecast::builder::encode_partition;
use demand_forecast::{
    CategoricalField, DatePart, EncodingOptions, FeatureSchema, NumericField, RawRecord,
};
use pretty_assertions::assert_eq;

fn fit(records: &[RawRecord]) -> FeatureSchema {
    let refs: Vec<&RawRecord> = records.iter().collect();
    FeatureSchema::fit(&refs, EncodingOptions::default()).unwrap()
}

#[test]
fn test_column_order() {
    let records = common::sample_records(20);
    let schema = fit(&records);
    let columns = schema.columns();

    let numeric: Vec<&str> = NumericField::ALL.iter().map(|f| f.column()).collect();
    let head: Vec<&str> = columns[..6].iter().map(String::as_str).collect();
    assert_eq!(head, numeric);

    let tail: Vec<&str> = columns[columns.len() - 3..].iter().map(String::as_str).collect();
    assert_eq!(tail, vec!["Day", "Month", "Year"]);

    assert!(!columns.iter().any(|c| c == "Units Sold"));
    assert!(!columns.iter().any(|c| c == "Date"));

    // Indicator blocks follow the categorical field order
    let block_starts: Vec<usize> = CategoricalField::ALL
        .iter()
        .map(|f| {
            columns
                .iter()
                .position(|c| c.starts_with(&format!("{}_", f.column())))
                .unwrap()
        })
        .collect();
    let mut sorted = block_starts.clone();
    sorted.sort_unstable();
    assert_eq!(block_starts, sorted);
}

#[test]
fn test_indicator_levels() {
    let records = common::sample_records(20);
    let schema = fit(&records);

    // Last sorted level of each field is the reference
    assert!(schema.contains("Store ID_S1"));
    assert!(!schema.contains("Store ID_S2"));
    assert!(schema.contains("Product ID_P1"));
    assert!(schema.contains("Product ID_P2"));
    assert!(!schema.contains("Product ID_P3"));
    assert!(schema.contains("Weather Condition_Cloudy"));
    assert!(!schema.contains("Weather Condition_Sunny"));
    assert!(schema.contains("Holiday/Promotion_0"));
    assert!(!schema.contains("Holiday/Promotion_1"));

    // 6 numeric + (1 + 2 + 1 + 1 + 2 + 1 + 1) indicators + 3 date parts
    assert_eq!(schema.len(), 6 + 9 + 3);
}

#[test]
fn test_encoding_reproduces_training_rows() {
    let records = common::sample_records(30);
    let refs: Vec<&RawRecord> = records.iter().collect();
    let schema = fit(&records);
    let (matrix, targets) = encode_partition(&schema, &refs).unwrap();

    assert_eq!(matrix.ncols(), schema.len());
    for (i, record) in records.iter().enumerate() {
        let vector = schema.encode(record).unwrap();
        assert_eq!(vector.len(), schema.len());
        assert_eq!(vector.as_slice(), matrix.row(i).to_vec().as_slice());
        assert_eq!(targets[i], record.units_sold.unwrap());
    }
}

#[test]
fn test_unseen_level_encodes_as_reference() {
    let records = common::sample_records(20);
    let schema = fit(&records);

    let reference = records[1].clone();
    assert_eq!(reference.store_id.as_deref(), Some("S2"));

    let mut unseen = reference.clone();
    unseen.store_id = Some("S9".to_string());
    let mut missing = reference.clone();
    missing.store_id = None;

    let expected = schema.encode(&reference).unwrap();
    assert_eq!(schema.encode(&unseen).unwrap(), expected);
    assert_eq!(schema.encode(&missing).unwrap(), expected);
}

#[test]
fn test_missing_numeric_uses_training_fill() {
    let records = common::sample_records(20);
    let schema = fit(&records);

    let mut record = records[0].clone();
    record.price = None;
    record.discount = None;
    let vector = schema.encode(&record).unwrap();

    let price_at = schema.position("Price").unwrap();
    let discount_at = schema.position("Discount").unwrap();
    assert_eq!(vector.as_slice()[price_at], schema.fill_for(NumericField::Price));
    assert_eq!(vector.as_slice()[discount_at], 0.0);
}

#[test]
fn test_date_parts() {
    let records = common::sample_records(5);
    let refs: Vec<&RawRecord> = records.iter().collect();
    let schema = FeatureSchema::fit(
        &refs,
        EncodingOptions {
            include_day_of_week: true,
        },
    )
    .unwrap();

    assert_eq!(schema.columns().last().unwrap(), DatePart::DayOfWeek.column());

    // 2024-01-03 is a Wednesday
    let vector = schema.encode(&records[2]).unwrap();
    let at = |c: &str| vector.as_slice()[schema.position(c).unwrap()];
    assert_eq!(at("Day"), 3.0);
    assert_eq!(at("Month"), 1.0);
    assert_eq!(at("Year"), 2024.0);
    assert_eq!(at("Day Of Week"), 2.0);
}

#[test]
fn test_schema_json_round_trip() {
    let records = common::sample_records(20);
    let schema = fit(&records);

    let json = serde_json::to_string(&schema).unwrap();
    let restored: FeatureSchema = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, schema);
    assert_eq!(
        restored.encode(&records[3]).unwrap(),
        schema.encode(&records[3]).unwrap()
    );
}

#[test]
fn test_unknown_format_version_is_rejected() {
    let records = common::sample_records(20);
    let schema = fit(&records);

    let mut value = serde_json::to_value(&schema).unwrap();
    value["format_version"] = serde_json::json!(99);

    assert!(serde_json::from_value::<FeatureSchema>(value).is_err());
}
