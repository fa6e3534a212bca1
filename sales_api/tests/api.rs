use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate};
use demand_forecast::{
    ArtifactBundle, ArtifactHandle, BuilderConfig, InferenceAdapter, MemoryPredictionStore,
    RawRecord, SchemaBuilder,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use sales_api::{router, AppState, MarketDataStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn records(n: usize) -> Vec<RawRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let demand = 40.0 + (i % 13) as f64 * 4.0;
            let price = 12.0 + (i % 4) as f64 * 3.0;
            RawRecord {
                date: Some(start + Duration::days(i as i64)),
                store_id: Some(if i % 2 == 0 { "S1" } else { "S2" }.to_string()),
                product_id: Some(format!("P{}", i % 3)),
                category: Some(["Toys", "Groceries"][i % 2].to_string()),
                region: Some(["North", "South"][(i / 2) % 2].to_string()),
                inventory_level: Some(150.0 + (i % 9) as f64 * 10.0),
                units_sold: Some(0.9 * demand - price + (i % 4) as f64),
                units_ordered: Some(30.0 + (i % 5) as f64 * 6.0),
                demand_forecast: Some(demand),
                price: Some(price),
                discount: Some(((i % 3) * 10) as f64),
                weather_condition: Some(["Sunny", "Rainy"][i % 2].to_string()),
                holiday_promotion: Some((i % 2).to_string()),
                competitor_pricing: Some(price + 0.5),
                seasonality: Some(["Winter", "Spring"][(i / 8) % 2].to_string()),
            }
        })
        .collect()
}

fn state_with(handle: ArtifactHandle) -> AppState {
    AppState {
        adapter: Arc::new(InferenceAdapter::new(Arc::new(handle))),
        predictions: Arc::new(MemoryPredictionStore::new()),
        market: Arc::new(MarketDataStore::new()),
        default_page_size: 100,
    }
}

fn app() -> Router {
    let trained = SchemaBuilder::new(BuilderConfig::default())
        .unwrap()
        .build(&records(40))
        .unwrap();
    let bundle = ArtifactBundle::from_trained("api-test", trained).unwrap();
    router(state_with(ArtifactHandle::from_bundle(bundle)))
}

fn predict_body(store_id: &str) -> Value {
    json!({
        "store_id": store_id,
        "product_id": "P1",
        "category": "Toys",
        "region": "North",
        "date": "2024-02-20",
        "inventory_level": 180,
        "units_ordered": 42,
        "demand_forecast": 60,
        "price": 15.0,
        "discount": 10,
        "weather_condition": "Sunny",
        "holiday_promotion": "no(0)",
        "competitor_pricing": 15.5,
        "seasonality": "Winter"
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn predict_returns_sales_and_id() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/predict/", Some(predict_body("S1"))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["predicted_sales"].as_f64().unwrap().is_finite());
    let id = body["prediction_id"].as_str().unwrap().to_string();

    let (status, record) = send(&app, Method::GET, &format!("/api/predictions/{}/", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["store_id"], "S1");
    assert_eq!(record["model_version"], "api-test");
    assert_eq!(record["actual_sales"], Value::Null);
}

#[tokio::test]
async fn unseen_and_reference_stores_predict_alike() {
    let app = app();
    let (_, s2) = send(&app, Method::POST, "/api/predict/", Some(predict_body("S2"))).await;
    let (_, s9) = send(&app, Method::POST, "/api/predict/", Some(predict_body("S9"))).await;

    assert_eq!(s2["predicted_sales"], s9["predicted_sales"]);
}

#[tokio::test]
async fn invalid_request_is_bad_request() {
    let app = app();
    let mut body = predict_body("S1");
    body["discount"] = json!(250);
    body.as_object_mut().unwrap().remove("region");

    let (status, error) = send(&app, Method::POST, "/api/predict/", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = error["error"].as_str().unwrap();
    assert!(message.contains("discount"));
    assert!(message.contains("region is required"));

    let (_, list) = send(&app, Method::GET, "/api/predictions/", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/predict/")
        .body(Body::from("{oops"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_model_is_service_unavailable() {
    let app = router(state_with(ArtifactHandle::unavailable("no bundle published")));

    let (status, body) = send(&app, Method::POST, "/api/predict/", Some(predict_body("S1"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("no bundle published"));

    let (status, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["model_loaded"], false);
}

#[tokio::test]
async fn health_reports_version() {
    let app = app();
    let (status, health) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["model_version"], "api-test");
}

#[tokio::test]
async fn actual_sales_can_be_recorded() {
    let app = app();
    let (_, created) = send(&app, Method::POST, "/api/predict/", Some(predict_body("S1"))).await;
    let uri = format!("/api/predictions/{}/", created["prediction_id"].as_str().unwrap());

    let (status, updated) =
        send(&app, Method::PATCH, &uri, Some(json!({ "actual_sales": 33.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["actual_sales"], 33.0);

    let (_, stats) = send(&app, Method::GET, "/api/stats/", None).await;
    assert_eq!(stats["prediction_count"], 1);
    assert_eq!(stats["avg_actual_sales"], 33.0);
    assert_eq!(stats["top_categories"][0]["category"], "Toys");
    assert_eq!(stats["market_data_count"], 0);
}

#[tokio::test]
async fn unknown_prediction_is_not_found() {
    let app = app();
    let uri = format!("/api/predictions/{}/", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/predictions/not-a-uuid/", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn market_data_round_trip() {
    let app = app();
    let row = json!({
        "date": "2024-05-01",
        "store_id": 7,
        "product_id": "P1",
        "category": "Toys",
        "region": "East",
        "inventory_level": 90,
        "units_sold": 12,
        "units_ordered": 20,
        "demand_forecast": 14,
        "price": 9.99,
        "discount": 5,
        "weather_condition": "Cloudy",
        "holiday_promotion": 0,
        "competitor_pricing": 10.49,
        "seasonality": "Spring"
    });

    let (status, created) = send(&app, Method::POST, "/api/market-data/", Some(row)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["store_id"], "7");

    let (_, rows) = send(&app, Method::GET, "/api/market-data/?limit=10", None).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);

    let (_, seasonal) = send(&app, Method::GET, "/api/seasonal-analysis/", None).await;
    assert_eq!(
        seasonal,
        json!([{
            "category": "Toys",
            "seasonality": "Spring",
            "count": 1,
            "avg_units_sold": 12.0,
            "total_units_sold": 12.0
        }])
    );

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/market-data/",
        Some(json!({ "date": "2024-05-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
