//! Fixed category tables used for reports.

/// (key, display label, short code)
const CATEGORIES: &[(&str, &str, &str)] = &[
    ("water-supply", "Water Supply Issues", "water"),
    ("water-demand", "Water Demand Issues", "demand"),
    ("dust-impacts", "Airborne Dust Impacts", "dust"),
    ("heat-impacts", "Heat Impacts", "heat"),
    ("rainwater-entry", "Rainwater Entry", "rain"),
    ("flood-management", "Flood Management", "flood"),
    ("wildfire-impacts", "Wildfire Impacts", "fire"),
    ("electricity-supply", "Electricity Supply", "elec"),
    ("air-quality", "Air Quality", "air"),
];

fn lookup(key: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    CATEGORIES.iter().find(|(k, _, _)| *k == key)
}

/// Display label for a category; unknown keys are shown as-is.
pub fn category_label(key: &str) -> &str {
    lookup(key).map(|(_, label, _)| *label).unwrap_or(key)
}

/// Short code used in report file names; unknown keys are used as-is.
pub fn category_short_code(key: &str) -> &str {
    lookup(key).map(|(_, _, short)| *short).unwrap_or(key)
}

pub fn known_categories() -> impl Iterator<Item = &'static str> {
    CATEGORIES.iter().map(|(key, _, _)| *key)
}
