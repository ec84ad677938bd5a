//! Carbon intensity HTTP endpoints.
//!
//! - GET  /api/carbon/current?postcode=G1
//! - GET  /api/carbon/forecast?postcode=G1&hours=48
//! - POST /api/carbon/optimal-time
//! - GET  /api/carbon/tasks?category=office

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use crate::errors::{AppError, ErrorResponse};
use crate::routes::AppState;
use crate::services::optimizer::{self, OptimalWindow};
use crate::services::presets::{self, TaskCategory, TaskPreset};

/// Default forecast length for the forecast endpoint.
const DEFAULT_FORECAST_HOURS: i64 = 48;

/// Longest postcode fragment we forward upstream ("SW1A 1AA" without space is 7).
const MAX_POSTCODE_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Query / body structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
pub struct CurrentQuery {
    /// UK postcode or outward code (e.g. "G1"). Defaults to the configured postcode.
    pub postcode: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ForecastQuery {
    /// UK postcode or outward code (e.g. "G1")
    pub postcode: Option<String>,
    /// Hours ahead to forecast (1 to the configured maximum, default 48)
    pub hours: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TasksQuery {
    /// Only list presets in this category (household, office, manufacturing, retail)
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OptimalTimeRequest {
    /// Preset identifier (see `/api/carbon/tasks`)
    pub task_type: String,
    /// UK postcode or outward code. Defaults to the configured postcode.
    pub postcode: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentIntensityData {
    /// Intensity in gCO2/kWh
    pub intensity: u32,
    /// Region short name
    pub region: String,
    /// When the reading was fetched (ISO 8601)
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentIntensityResponse {
    pub success: bool,
    pub data: CurrentIntensityData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastSlot {
    /// Slot start (ISO 8601)
    pub from: String,
    /// Slot end (ISO 8601)
    pub to: String,
    /// Forecast intensity in gCO2/kWh
    pub intensity: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastData {
    pub postcode: String,
    pub forecast: Vec<ForecastSlot>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastResponse {
    pub success: bool,
    pub data: ForecastData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OptimalWindowBody {
    pub start_time: String,
    pub end_time: String,
    pub avg_intensity: i64,
    pub carbon_saved_grams: i64,
    pub percentage_saved: i64,
}

impl From<&OptimalWindow> for OptimalWindowBody {
    fn from(w: &OptimalWindow) -> Self {
        Self {
            start_time: w.start_time.to_rfc3339(),
            end_time: w.end_time.to_rfc3339(),
            avg_intensity: w.avg_intensity,
            carbon_saved_grams: w.carbon_saved_grams,
            percentage_saved: w.percentage_saved,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OptimalTimeResponse {
    pub task_label: String,
    pub task_icon: String,
    pub optimal_window: OptimalWindowBody,
    /// Intensity of the first forecast slot ("if run now")
    pub current_intensity: i64,
    /// Number of forecast slots searched
    pub forecast_length: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskPresetBody {
    pub key: String,
    pub label: String,
    pub duration_hours: f64,
    pub energy_kwh: f64,
    pub icon: String,
    pub category: TaskCategory,
}

impl From<&TaskPreset> for TaskPresetBody {
    fn from(p: &TaskPreset) -> Self {
        Self {
            key: p.id.to_string(),
            label: p.label.to_string(),
            duration_hours: p.duration_hours,
            energy_kwh: p.energy_kwh,
            icon: p.icon.to_string(),
            category: p.category,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TasksResponse {
    pub success: bool,
    /// Presets keyed by identifier
    pub data: BTreeMap<String, TaskPresetBody>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Resolve and validate the postcode used in upstream URL paths.
fn resolve_postcode(requested: Option<&str>, default: &str) -> Result<String, AppError> {
    let postcode: String = requested
        .unwrap_or(default)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    if postcode.is_empty() || postcode.len() > MAX_POSTCODE_LEN {
        return Err(AppError::BadRequest(format!(
            "postcode must be 1 to {} characters",
            MAX_POSTCODE_LEN
        )));
    }
    if !postcode.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::BadRequest(
            "postcode may only contain letters and digits".to_string(),
        ));
    }
    Ok(postcode)
}

fn validate_horizon(hours: i64, max: u32) -> Result<u32, AppError> {
    if hours < 1 || hours > i64::from(max) {
        return Err(AppError::InvalidHorizon {
            requested: hours,
            max,
        });
    }
    Ok(hours as u32)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Get the current carbon intensity for a postcode.
#[utoipa::path(
    get,
    path = "/api/carbon/current",
    tag = "Carbon",
    params(CurrentQuery),
    responses(
        (status = 200, description = "Latest intensity reading", body = CurrentIntensityResponse),
        (status = 400, description = "Invalid postcode", body = ErrorResponse),
        (status = 502, description = "Carbon intensity provider unavailable", body = ErrorResponse),
    )
)]
pub async fn get_current_intensity(
    State(state): State<AppState>,
    Query(params): Query<CurrentQuery>,
) -> Result<Json<CurrentIntensityResponse>, AppError> {
    let postcode = resolve_postcode(params.postcode.as_deref(), &state.config.default_postcode)?;
    let current = state.source.get_current_intensity(&postcode).await?;

    Ok(Json(CurrentIntensityResponse {
        success: true,
        data: CurrentIntensityData {
            intensity: current.intensity,
            region: current.region,
            timestamp: current.observed_at.to_rfc3339(),
        },
    }))
}

/// Get the carbon intensity forecast for the next N hours.
#[utoipa::path(
    get,
    path = "/api/carbon/forecast",
    tag = "Carbon",
    params(ForecastQuery),
    responses(
        (status = 200, description = "Half-hourly forecast", body = ForecastResponse),
        (status = 400, description = "Invalid postcode or horizon", body = ErrorResponse),
        (status = 502, description = "Carbon intensity provider unavailable", body = ErrorResponse),
    )
)]
pub async fn get_forecast(
    State(state): State<AppState>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>, AppError> {
    let postcode = resolve_postcode(params.postcode.as_deref(), &state.config.default_postcode)?;
    let hours = validate_horizon(
        params.hours.unwrap_or(DEFAULT_FORECAST_HOURS),
        state.config.max_horizon_hours,
    )?;

    let series = state.source.get_forecast(&postcode, hours).await?;

    Ok(Json(ForecastResponse {
        success: true,
        data: ForecastData {
            postcode,
            forecast: series
                .iter()
                .map(|slot| ForecastSlot {
                    from: slot.start.to_rfc3339(),
                    to: slot.end.to_rfc3339(),
                    intensity: slot.intensity,
                })
                .collect(),
        },
    }))
}

/// Calculate the lowest-carbon time to run a task.
///
/// Looks up the task preset, fetches the forecast for the configured search
/// horizon, and returns the contiguous window with the lowest average
/// intensity along with the saving compared with starting now.
#[utoipa::path(
    post,
    path = "/api/carbon/optimal-time",
    tag = "Carbon",
    request_body = OptimalTimeRequest,
    responses(
        (status = 200, description = "Optimal window for the task", body = OptimalTimeResponse),
        (status = 400, description = "Unknown task type or invalid postcode", body = ErrorResponse),
        (status = 422, description = "Forecast too short for the task", body = ErrorResponse),
        (status = 502, description = "Carbon intensity provider unavailable", body = ErrorResponse),
    )
)]
pub async fn calculate_optimal_time(
    State(state): State<AppState>,
    Json(request): Json<OptimalTimeRequest>,
) -> Result<Json<OptimalTimeResponse>, AppError> {
    let task = presets::find_preset(&request.task_type).ok_or_else(|| {
        let valid: Vec<&str> = presets::all_presets().iter().map(|p| p.id).collect();
        AppError::BadRequest(format!(
            "Invalid task type '{}'. Valid options: {}",
            request.task_type,
            valid.join(", ")
        ))
    })?;
    let postcode = resolve_postcode(request.postcode.as_deref(), &state.config.default_postcode)?;

    let series = state
        .source
        .get_forecast(&postcode, state.config.optimal_horizon_hours)
        .await?;
    let window = optimizer::select_for(&series, task.profile())?;

    tracing::info!(
        "Optimal window for {} in {}: {} ({}% saved)",
        task.id,
        postcode,
        window.start_time,
        window.percentage_saved
    );

    Ok(Json(OptimalTimeResponse {
        task_label: task.label.to_string(),
        task_icon: task.icon.to_string(),
        optimal_window: OptimalWindowBody::from(&window),
        current_intensity: window.baseline_intensity,
        forecast_length: series.len(),
    }))
}

/// List the available task presets.
#[utoipa::path(
    get,
    path = "/api/carbon/tasks",
    tag = "Carbon",
    params(TasksQuery),
    responses(
        (status = 200, description = "Task presets keyed by identifier", body = TasksResponse),
        (status = 400, description = "Unknown category", body = ErrorResponse),
    )
)]
pub async fn get_tasks(Query(params): Query<TasksQuery>) -> Result<Json<TasksResponse>, AppError> {
    let selected: Vec<&TaskPreset> = match params.category.as_deref() {
        Some(raw) => {
            let category = TaskCategory::parse(raw).ok_or_else(|| {
                AppError::BadRequest(format!("Unknown category '{}'", raw))
            })?;
            presets::presets_in_category(category).collect()
        }
        None => presets::all_presets().iter().collect(),
    };

    Ok(Json(TasksResponse {
        success: true,
        data: selected
            .into_iter()
            .map(|p| (p.id.to_string(), TaskPresetBody::from(p)))
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::routes::build_router;
    use crate::services::carbon_api::CarbonApiClient;
    use crate::services::intensity::IntensitySource;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> AppConfig {
        AppConfig {
            port: 0,
            carbon_api_url: base_url.to_string(),
            default_postcode: "G1".to_string(),
            max_horizon_hours: 96,
            optimal_horizon_hours: 48,
            min_request_interval: Duration::ZERO,
            current_cache_ttl: Duration::from_secs(300),
            forecast_cache_ttl: Duration::from_secs(900),
            upstream_timeout: Duration::from_secs(2),
            cors_allowed_origins: vec![],
        }
    }

    fn router_for(server: &MockServer) -> axum::Router {
        let config = test_config(&server.uri());
        let client = CarbonApiClient::new(&config.carbon_api_url, config.upstream_timeout).unwrap();
        let source = IntensitySource::new(client, config.source_settings());
        build_router(AppState {
            source: Arc::new(source),
            config: Arc::new(config),
        })
    }

    /// Half-hour slots starting 2026-03-01T12:00Z.
    fn forecast_body(intensities: &[u32]) -> serde_json::Value {
        let base = "2026-03-01T12:00:00Z"
            .parse::<chrono::DateTime<chrono::Utc>>()
            .unwrap();
        let data: Vec<_> = intensities
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let from = base + chrono::Duration::minutes(30 * i as i64);
                let to = from + chrono::Duration::minutes(30);
                serde_json::json!({
                    "from": from.format("%Y-%m-%dT%H:%MZ").to_string(),
                    "to": to.format("%Y-%m-%dT%H:%MZ").to_string(),
                    "intensity": { "forecast": v }
                })
            })
            .collect();
        serde_json::json!({ "data": data })
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_resolve_postcode() {
        assert_eq!(resolve_postcode(None, "G1").unwrap(), "G1");
        assert_eq!(resolve_postcode(Some("sw1a 1aa"), "G1").unwrap(), "SW1A1AA");
        assert!(resolve_postcode(Some(""), "G1").is_err());
        assert!(resolve_postcode(Some("G1/../x"), "G1").is_err());
        assert!(resolve_postcode(Some("ABCDEFGHIJ"), "G1").is_err());
    }

    #[test]
    fn test_validate_horizon_bounds() {
        assert_eq!(validate_horizon(1, 96).unwrap(), 1);
        assert_eq!(validate_horizon(96, 96).unwrap(), 96);
        assert!(matches!(
            validate_horizon(0, 96),
            Err(AppError::InvalidHorizon { requested: 0, max: 96 })
        ));
        assert!(validate_horizon(97, 96).is_err());
        assert!(validate_horizon(-5, 96).is_err());
    }

    #[tokio::test]
    async fn test_current_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/regional/postcode/G1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "shortname": "Scotland", "data": [{ "intensity": { "forecast": 150 } }] }]
            })))
            .mount(&server)
            .await;

        let resp = router_for(&server)
            .oneshot(get("/api/carbon/current?postcode=G1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["intensity"], 150);
        assert_eq!(json["data"]["region"], "Scotland");
        assert!(json["data"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_current_endpoint_upstream_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let resp = router_for(&server)
            .oneshot(get("/api/carbon/current"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_forecast_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/regional/intensity/.+/postcode/G1$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[100, 120, 90])))
            .expect(1)
            .mount(&server)
            .await;

        let resp = router_for(&server)
            .oneshot(get("/api/carbon/forecast?postcode=G1&hours=24"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["data"]["postcode"], "G1");
        let forecast = json["data"]["forecast"].as_array().unwrap();
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast[2]["intensity"], 90);
        assert_eq!(forecast[0]["from"], "2026-03-01T12:00:00+00:00");
    }

    #[tokio::test]
    async fn test_forecast_endpoint_rejects_bad_horizon() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[100])))
            .expect(0)
            .mount(&server)
            .await;

        let router = router_for(&server);
        for uri in [
            "/api/carbon/forecast?hours=0",
            "/api/carbon/forecast?hours=97",
        ] {
            let resp = router.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_optimal_time_endpoint() {
        let server = MockServer::start().await;
        // Washing machine: 2h = 4 slots at 1.5 kWh. Cheapest 4 slots are the last four.
        Mock::given(method("GET"))
            .and(path_regex(r"^/regional/intensity/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[
                200, 190, 180, 170, 100, 90, 80, 70,
            ])))
            .mount(&server)
            .await;

        let resp = router_for(&server)
            .oneshot(post_json(
                "/api/carbon/optimal-time",
                serde_json::json!({ "task_type": "washing-machine", "postcode": "G1" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["task_label"], "Washing Machine");
        assert_eq!(json["current_intensity"], 200);
        assert_eq!(json["forecast_length"], 8);
        let window = &json["optimal_window"];
        assert_eq!(window["start_time"], "2026-03-01T14:00:00+00:00");
        assert_eq!(window["end_time"], "2026-03-01T16:00:00+00:00");
        assert_eq!(window["avg_intensity"], 85);
        // (200 - 85) * 1.5 * 1000
        assert_eq!(window["carbon_saved_grams"], 172_500);
        assert_eq!(window["percentage_saved"], 57);
    }

    #[tokio::test]
    async fn test_optimal_time_unknown_task() {
        let server = MockServer::start().await;
        let resp = router_for(&server)
            .oneshot(post_json(
                "/api/carbon/optimal-time",
                serde_json::json!({ "task_type": "time-machine" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("washing-machine"));
    }

    #[tokio::test]
    async fn test_optimal_time_forecast_too_short() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[100, 120])))
            .mount(&server)
            .await;

        let resp = router_for(&server)
            .oneshot(post_json(
                "/api/carbon/optimal-time",
                serde_json::json!({ "task_type": "ev-charging-home" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_tasks_endpoint() {
        let server = MockServer::start().await;
        let resp = router_for(&server)
            .oneshot(get("/api/carbon/tasks"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        let data = json["data"].as_object().unwrap();
        assert_eq!(data.len(), presets::all_presets().len());
        assert_eq!(data["dishwasher"]["key"], "dishwasher");
        assert_eq!(data["dishwasher"]["category"], "household");
    }

    #[tokio::test]
    async fn test_tasks_endpoint_filters_by_category() {
        let server = MockServer::start().await;
        let resp = router_for(&server)
            .oneshot(get("/api/carbon/tasks?category=retail"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        let data = json["data"].as_object().unwrap();
        assert!(!data.is_empty());
        assert!(data.values().all(|t| t["category"] == "retail"));

        let resp = router_for(&server)
            .oneshot(get("/api/carbon/tasks?category=garden"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_routes() {
        let server = MockServer::start().await;
        let router = router_for(&server);
        for uri in ["/health", "/api/v1/health", "/"] {
            let resp = router.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        }
    }
}
