use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

const SERVICE_NAME: &str = "carbon-scheduler-api";

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "healthy" while the process is serving requests
    pub status: String,
    /// Service identifier
    pub service: String,
    /// API version
    pub version: String,
}

/// Service banner returned at `/`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub status: String,
    /// Path to the Swagger UI
    pub docs: String,
}

/// Health check endpoint.
///
/// The service has no database or other hard dependency, so this only
/// confirms the process is up. Upstream availability is reported per request.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Service banner", body = RootResponse),
    )
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Carbon Scheduler API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        docs: "/swagger-ui/".to_string(),
    })
}
