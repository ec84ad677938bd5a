use std::str::FromStr;
use std::time::Duration;

use crate::services::intensity::SourceSettings;

const DEFAULT_CARBON_API_URL: &str = "https://api.carbonintensity.org.uk";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Base URL of the carbon intensity provider (no trailing slash).
    pub carbon_api_url: String,
    /// Postcode used when a request does not name one.
    pub default_postcode: String,
    /// Upper bound accepted by the forecast endpoint.
    pub max_horizon_hours: u32,
    /// Horizon fetched when searching for an optimal window.
    pub optimal_horizon_hours: u32,
    pub min_request_interval: Duration,
    pub current_cache_ttl: Duration,
    pub forecast_cache_ttl: Duration,
    pub upstream_timeout: Duration,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 8000),
            carbon_api_url: std::env::var("CARBON_API_URL")
                .unwrap_or_else(|_| DEFAULT_CARBON_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            default_postcode: std::env::var("DEFAULT_POSTCODE").unwrap_or_else(|_| "G1".to_string()),
            max_horizon_hours: env_or("MAX_HORIZON_HOURS", 96),
            optimal_horizon_hours: env_or("OPTIMAL_HORIZON_HOURS", 48),
            min_request_interval: Duration::from_millis(env_or("MIN_REQUEST_INTERVAL_MS", 2000)),
            current_cache_ttl: Duration::from_secs(env_or("CURRENT_CACHE_TTL_SECS", 300)),
            forecast_cache_ttl: Duration::from_secs(env_or("FORECAST_CACHE_TTL_SECS", 900)),
            upstream_timeout: Duration::from_secs(env_or("UPSTREAM_TIMEOUT_SECS", 10)),
            cors_allowed_origins: parse_origins(
                &std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
            ),
        }
    }

    /// Cache and rate-limit settings for the intensity source.
    pub fn source_settings(&self) -> SourceSettings {
        SourceSettings {
            min_request_interval: self.min_request_interval,
            current_ttl: self.current_cache_ttl,
            forecast_ttl: self.forecast_cache_ttl,
        }
    }
}

/// Read and parse an env var, falling back to `default` when unset or malformed.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{} has invalid value '{}', using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
