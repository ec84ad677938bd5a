pub mod carbon;
pub mod health;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::intensity::IntensitySource;

/// Shared application state for all endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) source: Arc<IntensitySource>,
    pub(crate) config: Arc<AppConfig>,
}

/// Build the API router (without CORS or Swagger, which `main` layers on).
pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/api/v1/health", get(health::health_check))
        .route("/api/carbon/current", get(carbon::get_current_intensity))
        .route("/api/carbon/forecast", get(carbon::get_forecast))
        .route("/api/carbon/optimal-time", post(carbon::calculate_optimal_time))
        .route("/api/carbon/tasks", get(carbon::get_tasks))
        .with_state(state)
}
