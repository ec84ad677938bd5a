//! carbonintensity.org.uk client.
//!
//! Fetches regional carbon intensity readings and forecasts from the
//! National Grid ESO Carbon Intensity API.
//! See: https://carbon-intensity.github.io/api-definitions/

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::helpers::{format_api_timestamp, parse_api_timestamp};

/// One forecast sample: `[start, end)` at a fixed intensity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct IntensitySlot {
    /// Slot start (inclusive, UTC)
    pub start: DateTime<Utc>,
    /// Slot end (exclusive, UTC)
    pub end: DateTime<Utc>,
    /// Forecast intensity in gCO2/kWh
    pub intensity: u32,
}

/// Latest reading for a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CurrentIntensity {
    /// Intensity in gCO2/kWh
    pub intensity: u32,
    /// Provider's short region name (e.g. "Scotland")
    pub region: String,
    /// When this reading was taken from the provider
    pub observed_at: DateTime<Utc>,
}

/// Client for the Carbon Intensity API.
#[derive(Debug, Clone)]
pub struct CarbonApiClient {
    client: reqwest::Client,
    base_url: String,
}

// --- Carbon Intensity JSON response types ---

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    data: ForecastData,
}

/// The national endpoints return the slots directly under `data`; the regional
/// endpoints wrap them in a region object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ForecastData {
    Slots(Vec<ApiSlot>),
    Region { data: Vec<ApiSlot> },
}

#[derive(Debug, Deserialize)]
struct ApiSlot {
    from: String,
    to: String,
    intensity: ApiIntensity,
}

#[derive(Debug, Deserialize)]
struct ApiIntensity {
    forecast: u32,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    data: Vec<ApiRegion>,
}

#[derive(Debug, Deserialize)]
struct ApiRegion {
    shortname: String,
    data: Vec<ApiReading>,
}

#[derive(Debug, Deserialize)]
struct ApiReading {
    intensity: ApiIntensity,
}

impl CarbonApiClient {
    /// Build a client against `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the forecast for `postcode` covering `[from, from + hours)`.
    pub async fn fetch_forecast(
        &self,
        postcode: &str,
        from: DateTime<Utc>,
        hours: u32,
    ) -> Result<Vec<IntensitySlot>, AppError> {
        let to = from + Duration::hours(i64::from(hours));
        let url = format!(
            "{}/regional/intensity/{}/{}/postcode/{}",
            self.base_url,
            format_api_timestamp(from),
            format_api_timestamp(to),
            postcode
        );

        let body: ForecastResponse = self.get_json(&url).await?;
        let raw = match body.data {
            ForecastData::Slots(slots) => slots,
            ForecastData::Region { data } => data,
        };
        parse_slots(raw)
    }

    /// Fetch the latest reading for `postcode`.
    pub async fn fetch_current(&self, postcode: &str) -> Result<CurrentIntensity, AppError> {
        let url = format!("{}/regional/postcode/{}", self.base_url, postcode);

        let body: CurrentResponse = self.get_json(&url).await?;
        let region = body.data.into_iter().next().ok_or_else(|| {
            AppError::UpstreamUnavailable("current intensity response has no regions".to_string())
        })?;
        let reading = region.data.into_iter().next().ok_or_else(|| {
            AppError::UpstreamUnavailable("current intensity response has no readings".to_string())
        })?;

        Ok(CurrentIntensity {
            intensity: reading.intensity.forecast,
            region: region.shortname,
            observed_at: Utc::now(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, AppError> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "carbonintensity.org.uk returned HTTP {}",
                response.status()
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("carbonintensity.org.uk JSON parse error: {}", e))
        })
    }
}

/// Convert wire slots into a validated, ascending series.
fn parse_slots(raw: Vec<ApiSlot>) -> Result<Vec<IntensitySlot>, AppError> {
    let mut slots = raw
        .into_iter()
        .map(|s| {
            let start = parse_api_timestamp(&s.from).map_err(AppError::UpstreamUnavailable)?;
            let end = parse_api_timestamp(&s.to).map_err(AppError::UpstreamUnavailable)?;
            if start >= end {
                return Err(AppError::UpstreamUnavailable(format!(
                    "slot {} .. {} is empty or reversed",
                    s.from, s.to
                )));
            }
            Ok(IntensitySlot {
                start,
                end,
                intensity: s.intensity.forecast,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    slots.sort_by_key(|s| s.start);

    // Windows are measured in slot counts, so the series must be gap-free.
    if let Some(pair) = slots.windows(2).find(|pair| pair[0].end != pair[1].start) {
        return Err(AppError::UpstreamUnavailable(format!(
            "forecast is not contiguous: slot ending {} is followed by slot starting {}",
            pair[0].end.to_rfc3339(),
            pair[1].start.to_rfc3339()
        )));
    }

    Ok(slots)
}
