use demand_forecast::DemandError;
use demand_math::MathError;
use std::io;

#[test]
fn test_error_display() {
    let cases = vec![
        (
            DemandError::Validation("price is required".to_string()),
            "Validation error: price is required",
        ),
        (
            DemandError::ArtifactUnavailable("no bundle".to_string()),
            "Model unavailable: no bundle",
        ),
        (
            DemandError::SchemaMismatch("width".to_string()),
            "Schema mismatch: width",
        ),
        (
            DemandError::TrainingData("empty".to_string()),
            "Training data error: empty",
        ),
        (
            DemandError::NotFound("prediction".to_string()),
            "Not found: prediction",
        ),
    ];

    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn test_client_errors() {
    assert!(DemandError::Validation(String::new()).is_client_error());
    assert!(DemandError::NotFound(String::new()).is_client_error());
    assert!(!DemandError::ArtifactUnavailable(String::new()).is_client_error());
    assert!(!DemandError::SchemaMismatch(String::new()).is_client_error());
}

#[test]
fn test_error_conversion() {
    let err: DemandError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(err, DemandError::Io(_)));

    let err: DemandError = MathError::DimensionMismatch {
        expected: 3,
        found: 2,
    }
    .into();
    assert_eq!(
        err.to_string(),
        "Math error: Dimension mismatch: expected 3 columns, found 2"
    );

    let err: DemandError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
    assert!(matches!(err, DemandError::Serialization(_)));
}
