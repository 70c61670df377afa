//! Locale-ambiguous price normalization

use regex::Regex;
use std::sync::OnceLock;

fn price_clean_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^0-9.,]").expect("price clean regex is valid"))
}

/// Parse a raw price snippet such as `"1.234,56 €"` or `"€1,234.56"`.
///
/// Separator rules:
/// - both `,` and `.` present: the one whose first occurrence comes later is
///   the decimal separator, the other is dropped
/// - only `,` present: decimal when at most two characters follow the last
///   comma, thousands otherwise
/// - only `.` present: kept as is, so `"1.234"` is `1.234`
///
/// Returns `None` for empty or non-numeric input; never panics.
pub fn parse_price(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }

    let cleaned = price_clean_pattern().replace_all(raw, "");
    let first_comma = cleaned.find(',');
    let first_dot = cleaned.find('.');

    let normalized = match (first_comma, first_dot) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => {
            let last_comma = cleaned.rfind(',').unwrap_or_default();
            if cleaned.len() - last_comma <= 3 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (None, _) => cleaned.into_owned(),
    };

    normalized.parse::<f64>().ok()
}
