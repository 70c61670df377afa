//! Utility functions and helpers

use chrono::{Local, NaiveDateTime, SubsecRound};

/// Round to the currency's minor unit (2 decimals)
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Current local time at microsecond precision
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

/// Format an optional price for log lines
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(value) => format!("{:.2}", value),
        None => "n/a".to_string(),
    }
}

/// Lowercase and drop whitespace so "96 GB" and "96gb" compare equal
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Generate unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
