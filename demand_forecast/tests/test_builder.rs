mod common;

use demand_forecast::utils::train_test_split;
use demand_forecast::{
    BuilderConfig, DemandError, EncodingOptions, FeatureSchema, NumericField, RawRecord,
    SchemaBuilder,
};
use demand_math::{LeastSquares, LinearModel, Regressor, Ridge, TrainedRegressor};
use ndarray::{Array1, Array2};
use rstest::rstest;

/// Least squares under a custom name
#[derive(Debug)]
struct Named(&'static str);

impl Regressor for Named {
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> demand_math::Result<LinearModel> {
        let model = LeastSquares::new().fit(x, y)?;
        Ok(LinearModel::from_parts(
            self.0,
            model.intercept(),
            model.coefficients().to_vec(),
        ))
    }

    fn name(&self) -> &str {
        self.0
    }
}

fn builder() -> SchemaBuilder {
    SchemaBuilder::new(BuilderConfig::default()).unwrap()
}

#[test]
fn test_build_reports_every_candidate() {
    let records = common::sample_records(40);
    let trained = builder().build(&records).unwrap();
    let report = &trained.report;

    assert_eq!(report.train_rows, 32);
    assert_eq!(report.eval_rows, 8);
    assert_eq!(report.seed, 42);
    assert_eq!(report.candidates.len(), 3);
    assert!(report.candidates.iter().any(|c| c.name == report.selected));
    assert_eq!(trained.model.name(), report.selected);

    let best = report
        .candidates
        .iter()
        .map(|c| c.r2)
        .fold(f64::NEG_INFINITY, f64::max);
    let selected = report
        .candidates
        .iter()
        .find(|c| c.name == report.selected)
        .unwrap();
    assert_eq!(selected.r2, best);
    assert_eq!(report.evaluation.r2, best);
}

#[test]
fn test_widths_agree() {
    let records = common::sample_records(40);
    let trained = builder().build(&records).unwrap();

    assert_eq!(trained.preprocessor.n_features(), trained.schema.len());
    assert_eq!(trained.model.n_features(), trained.schema.len());
}

#[test]
fn test_linear_target_is_learned() {
    let records = common::sample_records(60);
    let trained = builder().build(&records).unwrap();

    assert!(trained.report.train_r2 > 0.9, "{}", trained.report.train_r2);
}

#[test]
fn test_ties_resolve_to_first_candidate() {
    let records = common::sample_records(40);
    let trained = builder()
        .with_candidates(vec![Box::new(Named("first")), Box::new(Named("second"))])
        .build(&records)
        .unwrap();

    let scores: Vec<f64> = trained.report.candidates.iter().map(|c| c.r2).collect();
    assert_eq!(scores[0], scores[1]);
    assert_eq!(trained.report.selected, "first");
}

#[test]
fn test_candidate_order_is_evaluation_order() {
    let records = common::sample_records(40);
    let trained = builder()
        .with_candidates(vec![
            Box::new(Ridge::new(5.0).unwrap()),
            Box::new(LeastSquares::new()),
        ])
        .build(&records)
        .unwrap();

    let names: Vec<&str> = trained
        .report
        .candidates
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["Ridge Regression (alpha=5)", "Linear Regression"]);
}

#[test]
fn test_fits_use_training_partition_only() {
    let records = common::sample_records(40);
    let (train_idx, eval_idx) = train_test_split(records.len(), 0.2, 42).unwrap();

    // Distort only the evaluation rows
    let mut distorted = records.clone();
    for &i in &eval_idx {
        distorted[i].price = Some(10_000.0);
        distorted[i].store_id = Some("S0".to_string());
    }

    // Selection depends on evaluation scores, so fix a single candidate
    let least_squares = || builder().with_candidates(vec![Box::new(LeastSquares::new())]);
    let clean = least_squares().build(&records).unwrap();
    let dirty = least_squares().build(&distorted).unwrap();

    assert_eq!(clean.schema, dirty.schema);
    assert_eq!(clean.preprocessor, dirty.preprocessor);
    assert_eq!(clean.model, dirty.model);

    let train: Vec<&RawRecord> = train_idx.iter().map(|&i| &records[i]).collect();
    let expected = FeatureSchema::fit(&train, EncodingOptions::default()).unwrap();
    assert_eq!(
        clean.schema.fill_for(NumericField::Price),
        expected.fill_for(NumericField::Price)
    );
    assert!(!clean.schema.contains("Store ID_S0"));
}

#[test]
fn test_same_seed_same_bundle() {
    let records = common::sample_records(40);
    let a = builder().build(&records).unwrap();
    let b = builder().build(&records).unwrap();

    assert_eq!(a.schema, b.schema);
    assert_eq!(a.model, b.model);
    assert_eq!(a.report, b.report);
}

#[test]
fn test_empty_training_set() {
    assert!(matches!(
        builder().build(&[]),
        Err(DemandError::TrainingData(_))
    ));
}

#[test]
fn test_single_record_cannot_be_split() {
    let records = common::sample_records(1);
    assert!(matches!(
        builder().build(&records),
        Err(DemandError::TrainingData(_))
    ));
}

#[rstest]
#[case::all_null_price(|r: &mut RawRecord| r.price = None)]
#[case::all_null_target(|r: &mut RawRecord| r.units_sold = None)]
#[case::all_null_region(|r: &mut RawRecord| r.region = None)]
fn test_all_null_field_is_rejected(#[case] clear: fn(&mut RawRecord)) {
    let mut records = common::sample_records(20);
    records.iter_mut().for_each(clear);

    assert!(matches!(
        builder().build(&records),
        Err(DemandError::TrainingData(_))
    ));
}

#[test]
fn test_undated_record_is_rejected() {
    let mut records = common::sample_records(20);
    records[4].date = None;

    assert!(matches!(
        builder().build(&records),
        Err(DemandError::TrainingData(_))
    ));
}
