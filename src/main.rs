// Carbon Scheduler API v0.1
use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use routes::AppState;
use services::carbon_api::CarbonApiClient;
use services::intensity::IntensitySource;

/// Carbon Scheduler API — OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Carbon Scheduler API",
        version = "0.1.0",
        description = "Finds the lowest-carbon time to run a task on the UK grid. \
            Fetches and caches regional carbon intensity forecasts from \
            carbonintensity.org.uk and searches them for the contiguous window \
            with the lowest average intensity.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Carbon", description = "Carbon intensity, forecasts and optimal windows"),
    ),
    paths(
        routes::health::root,
        routes::health::health_check,
        routes::carbon::get_current_intensity,
        routes::carbon::get_forecast,
        routes::carbon::calculate_optimal_time,
        routes::carbon::get_tasks,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::health::RootResponse,
            routes::carbon::CurrentIntensityResponse,
            routes::carbon::CurrentIntensityData,
            routes::carbon::ForecastResponse,
            routes::carbon::ForecastData,
            routes::carbon::ForecastSlot,
            routes::carbon::OptimalTimeRequest,
            routes::carbon::OptimalTimeResponse,
            routes::carbon::OptimalWindowBody,
            routes::carbon::TasksResponse,
            routes::carbon::TaskPresetBody,
            services::presets::TaskCategory,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carbon_scheduler_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        "Using carbon intensity provider at {} (min interval {:?}, cache TTLs {:?}/{:?})",
        config.carbon_api_url,
        config.min_request_interval,
        config.current_cache_ttl,
        config.forecast_cache_ttl
    );

    let client = match CarbonApiClient::new(&config.carbon_api_url, config.upstream_timeout) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    let source = IntensitySource::new(client, config.source_settings());

    let cors = build_cors(&config.cors_allowed_origins);
    let port = config.port;

    let app_state = AppState {
        source: Arc::new(source),
        config: Arc::new(config),
    };

    let app = routes::build_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!("Swagger UI available at http://localhost:{}/swagger-ui/", port);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server terminated unexpectedly: {}", e);
        std::process::exit(1);
    }
}

/// CORS for the browser frontend. `*` in the origin list allows any origin.
fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    cors.allow_origin(allowed)
}
