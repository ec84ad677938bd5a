//! Shared helpers for UTC timestamp handling.
//!
//! The carbon intensity provider only accepts half-hour aligned instants and
//! emits timestamps like `2026-03-01T07:30Z` (no seconds), so both directions
//! need a little care:
//!
//! - `ceil_to_half_hour`: rounds forward to the next :00 / :30 boundary
//! - `format_api_timestamp` / `parse_api_timestamp`: the provider's wire format

use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};

/// Length of one provider forecast slot.
pub(crate) const SLOT_MINUTES: i64 = 30;

/// Round a datetime up to the next half-hour boundary (or keep it if already
/// exactly on one). Never moves backward in time.
pub(crate) fn ceil_to_half_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    let floored = floor_to_half_hour(dt);
    if floored == dt {
        dt
    } else {
        floored + Duration::minutes(SLOT_MINUTES)
    }
}

fn floor_to_half_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    let minute = if dt.minute() < 30 { 0 } else { 30 };
    dt.date_naive()
        .and_hms_opt(dt.hour(), minute, 0)
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
        .unwrap_or(dt)
}

/// Format an instant the way the provider expects it in URL paths.
pub(crate) fn format_api_timestamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%MZ").to_string()
}

/// Parse a provider timestamp as a UTC instant.
///
/// Accepts full RFC 3339 (`2026-03-01T07:30:00Z`) as well as the provider's
/// seconds-less form (`2026-03-01T07:30Z`).
pub(crate) fn parse_api_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let formats = ["%Y-%m-%dT%H:%MZ", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S%.fZ"];
    for fmt in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    Err(format!("Could not parse timestamp: {}", s))
}
