//! Built-in task presets.
//!
//! Each preset describes a typical appliance or process run. Durations are in
//! hours (possibly fractional); the optimizer works in half-hour forecast
//! slots, so `TaskPreset::profile` rounds the duration up to whole slots.

use serde::Serialize;
use utoipa::ToSchema;

use crate::helpers::SLOT_MINUTES;
use crate::services::optimizer::TaskProfile;

/// Business category a preset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Household,
    Office,
    Manufacturing,
    Retail,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 4] = [
        TaskCategory::Household,
        TaskCategory::Office,
        TaskCategory::Manufacturing,
        TaskCategory::Retail,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskCategory::Household => "household",
            TaskCategory::Office => "office",
            TaskCategory::Manufacturing => "manufacturing",
            TaskCategory::Retail => "retail",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

/// A named task with its typical run length and energy use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskPreset {
    /// Stable identifier used in requests (e.g. "washing-machine")
    pub id: &'static str,
    pub label: &'static str,
    pub duration_hours: f64,
    pub energy_kwh: f64,
    pub icon: &'static str,
    pub category: TaskCategory,
}

impl TaskPreset {
    /// Number of forecast slots one run occupies.
    pub fn slots(&self) -> usize {
        let slot_hours = SLOT_MINUTES as f64 / 60.0;
        (self.duration_hours / slot_hours).ceil() as usize
    }

    pub fn profile(&self) -> TaskProfile {
        TaskProfile {
            duration: self.slots(),
            energy_kwh: self.energy_kwh,
        }
    }
}

const fn preset(
    id: &'static str,
    label: &'static str,
    duration_hours: f64,
    energy_kwh: f64,
    icon: &'static str,
    category: TaskCategory,
) -> TaskPreset {
    TaskPreset {
        id,
        label,
        duration_hours,
        energy_kwh,
        icon,
        category,
    }
}

use TaskCategory::{Household, Manufacturing, Office, Retail};

static PRESETS: &[TaskPreset] = &[
    // Household
    preset("washing-machine", "Washing Machine", 2.0, 1.5, "🧺", Household),
    preset("dishwasher", "Dishwasher", 2.0, 1.8, "🍽️", Household),
    preset("tumble-dryer", "Tumble Dryer", 1.0, 2.5, "👕", Household),
    preset("ev-charging-home", "EV Charging (Home 7kW)", 4.0, 28.0, "🚗", Household),
    preset("hot-water", "Hot Water Heater", 1.0, 3.0, "🚿", Household),
    preset("pool-pump", "Pool Pump", 4.0, 1.2, "🏊", Household),
    preset("robot-vacuum-home", "Robot Vacuum (Home)", 1.5, 0.075, "🤖", Household),
    // Office
    preset("server-backup", "Server Backup", 3.0, 2.5, "💾", Office),
    preset("data-center-maintenance", "Data Center Maintenance", 6.0, 45.0, "🖥️", Office),
    preset("hvac-preheating", "Office HVAC Pre-heating", 2.0, 12.0, "🌡️", Office),
    preset("hvac-cooling", "Office HVAC Cooling", 3.0, 18.0, "❄️", Office),
    preset("document-scanning", "Bulk Document Scanning", 4.0, 3.2, "📄", Office),
    preset("battery-charging", "UPS Battery Charging", 8.0, 15.0, "🔋", Office),
    preset("commercial-ev-charging", "Fleet EV Charging (22kW)", 3.0, 66.0, "🚐", Office),
    preset("robot-vacuum-office", "Commercial Robot Vacuum", 2.0, 0.15, "🤖", Office),
    // Manufacturing
    preset("injection-molding", "Injection Molding Press", 6.0, 85.0, "🏭", Manufacturing),
    preset("industrial-oven", "Industrial Oven", 4.0, 120.0, "🔥", Manufacturing),
    preset("kiln-firing", "Kiln Firing Cycle", 8.0, 200.0, "⚱️", Manufacturing),
    preset("air-compressor", "Industrial Air Compressor", 2.0, 25.0, "💨", Manufacturing),
    preset("cnc-machining", "CNC Machine Operation", 4.0, 32.0, "⚙️", Manufacturing),
    preset("welding-operation", "Automated Welding Line", 3.0, 45.0, "🔧", Manufacturing),
    preset("heat-treatment", "Metal Heat Treatment", 6.0, 95.0, "🌡️", Manufacturing),
    preset("powder-coating", "Powder Coating Oven", 2.0, 35.0, "🎨", Manufacturing),
    preset("industrial-robot-vacuum", "Industrial Floor Cleaner", 3.0, 0.8, "🤖", Manufacturing),
    // Retail / hospitality
    preset("commercial-dishwasher", "Commercial Dishwasher", 2.0, 8.5, "🍽️", Retail),
    preset("industrial-laundry", "Commercial Laundry", 3.0, 22.0, "🧺", Retail),
    preset("bakery-oven", "Commercial Bakery Oven", 4.0, 65.0, "🍞", Retail),
    preset("refrigeration-defrost", "Refrigeration Defrost Cycle", 1.5, 12.0, "❄️", Retail),
    preset("food-prep-equipment", "Food Preparation Equipment", 2.0, 15.0, "🥘", Retail),
    preset("warehouse-lighting", "Warehouse Lighting System", 12.0, 48.0, "💡", Retail),
    preset("cold-storage", "Cold Storage Room", 6.0, 85.0, "🧊", Retail),
    preset("retail-robot-vacuum", "Store Robot Vacuum", 2.5, 0.2, "🤖", Retail),
];

/// All presets, in display order.
pub fn all_presets() -> &'static [TaskPreset] {
    PRESETS
}

pub fn find_preset(id: &str) -> Option<&'static TaskPreset> {
    PRESETS.iter().find(|p| p.id == id)
}

pub fn presets_in_category(category: TaskCategory) -> impl Iterator<Item = &'static TaskPreset> {
    PRESETS.iter().filter(move |p| p.category == category)
}
