//! Base price location in free page text

use regex::Regex;
use std::sync::OnceLock;

use super::parse_price;

/// Characters after a "Subtotal" anchor searched for its amount
const SUBTOTAL_WINDOW: usize = 60;

fn subtotal_anchor() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)sub-?total").expect("subtotal anchor regex is valid"))
}

fn currency_amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[$€£]\s*([0-9][0-9.,]*)|([0-9][0-9.,]*)\s*(?:€|EUR|USD|\$|£)")
            .expect("currency amount regex is valid")
    })
}

fn parse_amount(raw: &str) -> Option<f64> {
    parse_price(raw.trim_end_matches(['.', ',']))
}

fn currency_amounts(text: &str) -> impl Iterator<Item = f64> + '_ {
    currency_amount_pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .filter_map(|m| parse_amount(m.as_str()))
}

/// Text right after `start`, at most `SUBTOTAL_WINDOW` characters
fn anchor_window(text: &str, start: usize) -> &str {
    let rest = &text[start..];
    let end = rest
        .char_indices()
        .nth(SUBTOTAL_WINDOW)
        .map_or(rest.len(), |(index, _)| index);
    &rest[..end]
}

/// Currency amount following a "Subtotal" anchor, if the page shows one.
///
/// Only the first currency-formatted amount after each anchor counts, so an
/// item count such as "Subtotal (1 item)" is never read as the price. An
/// amount at or below `floor` disqualifies that anchor.
pub fn find_subtotal(text: &str, floor: f64) -> Option<f64> {
    subtotal_anchor().find_iter(text).find_map(|anchor| {
        currency_amounts(anchor_window(text, anchor.end()))
            .next()
            .filter(|value| *value > floor)
    })
}

/// Smallest currency-formatted amount strictly above `floor`.
///
/// The floor filters out shipping fees, monthly instalments and similar
/// small numbers that sit next to the real price.
pub fn lowest_currency_amount(text: &str, floor: f64) -> Option<f64> {
    currency_amounts(text)
        .filter(|value| *value > floor)
        .fold(None, |lowest: Option<f64>, value| match lowest {
            Some(current) if current <= value => Some(current),
            _ => Some(value),
        })
}

/// Subtotal anchor first, lowest plausible amount second
pub fn resolve_base_price(text: &str, floor: f64) -> Option<f64> {
    find_subtotal(text, floor).or_else(|| lowest_currency_amount(text, floor))
}
