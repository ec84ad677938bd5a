//! Cached, rate-limited access to carbon intensity data.
//!
//! `IntensitySource` sits between request handlers and `CarbonApiClient`:
//! fresh cache hits never touch the network, and every miss goes through the
//! shared rate limiter before calling upstream. Failed fetches leave the cache
//! untouched and are returned to the caller as-is.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::errors::AppError;
use crate::helpers::ceil_to_half_hour;
use crate::services::cache::TtlCache;
use crate::services::carbon_api::{CarbonApiClient, CurrentIntensity, IntensitySlot};
use crate::services::rate_limit::RateLimiter;

/// Cache TTLs and upstream spacing.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub min_request_interval: Duration,
    pub current_ttl: Duration,
    pub forecast_ttl: Duration,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            min_request_interval: Duration::from_secs(2),
            current_ttl: Duration::from_secs(5 * 60),
            forecast_ttl: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ForecastKey {
    postcode: String,
    horizon_hours: u32,
}

/// Shared intensity source. Construct once and share behind an `Arc`.
#[derive(Debug)]
pub struct IntensitySource {
    client: CarbonApiClient,
    limiter: RateLimiter,
    current_cache: TtlCache<String, CurrentIntensity>,
    forecast_cache: TtlCache<ForecastKey, Vec<IntensitySlot>>,
}

impl IntensitySource {
    pub fn new(client: CarbonApiClient, settings: SourceSettings) -> Self {
        Self {
            client,
            limiter: RateLimiter::new(settings.min_request_interval),
            current_cache: TtlCache::new(settings.current_ttl),
            forecast_cache: TtlCache::new(settings.forecast_ttl),
        }
    }

    /// Latest intensity reading for `postcode`.
    pub async fn get_current_intensity(&self, postcode: &str) -> Result<CurrentIntensity, AppError> {
        let key = postcode.to_string();
        if let Some(cached) = self.current_cache.get_fresh(&key) {
            tracing::debug!("Current intensity cache hit for {}", postcode);
            return Ok(cached);
        }

        self.limiter.acquire().await;
        let current = self.client.fetch_current(postcode).await.inspect_err(|e| {
            tracing::warn!("Current intensity fetch for {} failed: {}", postcode, e);
        })?;

        self.current_cache.insert(key, current.clone());
        Ok(current)
    }

    /// Forecast series for `postcode` covering `horizon_hours` from the next
    /// half-hour boundary.
    ///
    /// Callers must validate `1 <= horizon_hours <= max_horizon_hours`; out of
    /// range values are an `InvalidHorizon` at the HTTP boundary.
    pub async fn get_forecast(
        &self,
        postcode: &str,
        horizon_hours: u32,
    ) -> Result<Vec<IntensitySlot>, AppError> {
        self.get_forecast_from(postcode, horizon_hours, Utc::now())
            .await
    }

    async fn get_forecast_from(
        &self,
        postcode: &str,
        horizon_hours: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<IntensitySlot>, AppError> {
        let key = ForecastKey {
            postcode: postcode.to_string(),
            horizon_hours,
        };
        if let Some(cached) = self.forecast_cache.get_fresh(&key) {
            tracing::debug!(
                "Forecast cache hit for {} ({}h, {} slots)",
                postcode,
                horizon_hours,
                cached.len()
            );
            return Ok(cached);
        }

        let from = ceil_to_half_hour(now);
        self.limiter.acquire().await;
        let series = self
            .client
            .fetch_forecast(postcode, from, horizon_hours)
            .await
            .inspect_err(|e| {
                tracing::warn!("Forecast fetch for {} failed: {}", postcode, e);
            })?;

        tracing::debug!(
            "Fetched {} forecast slots for {} from {}",
            series.len(),
            postcode,
            from
        );
        self.forecast_cache.insert(key, series.clone());
        Ok(series)
    }
}
