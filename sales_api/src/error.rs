//! HTTP mapping of pipeline errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use demand_forecast::DemandError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Demand(#[from] DemandError),

    /// A blocking task panicked or was cancelled
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Demand(DemandError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Demand(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Demand(DemandError::ArtifactUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Demand(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", self);
        } else {
            warn!(status = status.as_u16(), "{}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
