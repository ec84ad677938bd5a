use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The carbon-intensity provider could not be reached, answered with a
    /// non-success status, or returned a payload we could not parse.
    #[error("Carbon intensity provider unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The forecast series is shorter than the task needs.
    #[error("Forecast covers {available} slots but the task needs {required}")]
    InsufficientForecastHorizon { required: usize, available: usize },

    #[error("Forecast horizon must be between 1 and {max} hours, got {requested}")]
    InvalidHorizon { requested: i64, max: u32 },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) | AppError::InvalidHorizon { .. } => StatusCode::BAD_REQUEST,
            AppError::UpstreamUnavailable(cause) => {
                tracing::warn!("Upstream failure surfaced to client: {}", cause);
                StatusCode::BAD_GATEWAY
            }
            AppError::InsufficientForecastHorizon { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            AppError::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::UpstreamUnavailable(format!("request timed out: {}", err))
        } else {
            AppError::UpstreamUnavailable(format!("request failed: {}", err))
        }
    }
}
