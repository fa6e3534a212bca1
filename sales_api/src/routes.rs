//! HTTP routes

use crate::error::{ApiError, ApiResult};
use crate::market::{MarketData, MarketDataInput, MarketDataStore, SeasonalSummary};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use demand_forecast::{
    DemandError, InferenceAdapter, PredictionOutcome, PredictionRecord, PredictionRequest,
    PredictionStats, PredictionStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<InferenceAdapter>,
    pub predictions: Arc<dyn PredictionStore>,
    pub market: Arc<MarketDataStore>,
    pub default_page_size: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/predict/", post(predict))
        .route("/api/predictions/", get(list_predictions))
        .route(
            "/api/predictions/:id/",
            get(get_prediction).patch(update_prediction),
        )
        .route(
            "/api/market-data/",
            get(list_market_data).post(create_market_data),
        )
        .route("/api/stats/", get(stats))
        .route("/api/seasonal-analysis/", get(seasonal_analysis))
        .route("/health", get(health))
        .with_state(state)
}

// Request/Response types

#[derive(Deserialize)]
struct PageQuery {
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct ActualSalesUpdate {
    actual_sales: f64,
}

#[derive(Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    predictions: PredictionStats,
    market_data_count: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    model_version: Option<String>,
    error: Option<String>,
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| DemandError::Validation(format!("Invalid request body: {}", e)).into())
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| DemandError::Validation(format!("'{}' is not a prediction id", raw)).into())
}

// Handlers

async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<PredictionOutcome>> {
    let request = PredictionRequest::from_json(&body)?;
    // First use may load artifacts from disk
    let outcome = tokio::task::spawn_blocking(move || {
        state
            .adapter
            .predict_and_record(&request, state.predictions.as_ref())
    })
    .await??;
    Ok(Json(outcome))
}

async fn list_predictions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PredictionRecord>>> {
    Ok(Json(state.predictions.list()?))
}

async fn get_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PredictionRecord>> {
    let id = parse_id(&id)?;
    Ok(Json(state.predictions.get(id)?))
}

async fn update_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<PredictionRecord>> {
    let id = parse_id(&id)?;
    let update: ActualSalesUpdate = parse_json(&body)?;
    Ok(Json(state.predictions.set_actual(id, update.actual_sales)?))
}

async fn list_market_data(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Json<Vec<MarketData>> {
    let limit = page.limit.unwrap_or(state.default_page_size);
    Json(state.market.list(Some(limit)))
}

async fn create_market_data(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<MarketData>)> {
    let input: MarketDataInput = parse_json(&body)?;
    let row = state.market.insert(input)?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    Ok(Json(StatsResponse {
        predictions: state.predictions.stats()?,
        market_data_count: state.market.len(),
    }))
}

async fn seasonal_analysis(State(state): State<AppState>) -> Json<Vec<SeasonalSummary>> {
    Json(state.market.seasonal_analysis())
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let handle = Arc::clone(state.adapter.artifacts());
    let loaded = tokio::task::spawn_blocking(move || handle.get())
        .await
        .map_err(ApiError::from)
        .and_then(|r| r.map_err(ApiError::from));

    match loaded {
        Ok(bundle) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                model_loaded: true,
                model_version: Some(bundle.version.clone()),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded",
                model_loaded: false,
                model_version: None,
                error: Some(e.to_string()),
            }),
        ),
    }
}
