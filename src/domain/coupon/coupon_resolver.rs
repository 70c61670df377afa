//! Coupon discovery and discount computation

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::domain::price::parse_price;
use crate::shared::types::ObservationMetadata;
use crate::shared::utils::round_to_cents;

/// How an inferred coupon value reduces the base price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Fixed,
    Percentage,
}

/// A coupon found on a page together with its inferred value
#[derive(Debug, Clone, PartialEq)]
pub struct CouponCandidate {
    pub code: String,
    pub value: f64,
    pub kind: DiscountKind,
}

/// Outcome of applying every coupon of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountResolution {
    pub base_price: f64,
    pub discount_amount: f64,
    pub codes: Vec<String>,
}

impl DiscountResolution {
    /// `base - discount`, not clamped: a negative result is surfaced as is
    pub fn final_price(&self) -> f64 {
        self.base_price - self.discount_amount
    }

    pub fn to_metadata(&self) -> ObservationMetadata {
        ObservationMetadata {
            base_price: self.base_price,
            discount_applied: self.discount_amount,
            coupons_found: self.codes.clone(),
        }
    }
}

/// `PREFIX\w+` code matcher
#[derive(Debug, Clone)]
pub struct CouponPattern {
    prefix: String,
    code: Regex,
}

impl CouponPattern {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let code = Regex::new(&format!(r"{}\w+", regex::escape(prefix)))?;
        Ok(Self {
            prefix: prefix.to_string(),
            code,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Distinct codes in order of first appearance
    pub fn find_codes(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.code
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|code| seen.insert(*code))
            .map(str::to_string)
            .collect()
    }
}

fn off_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)OFF$").expect("OFF suffix regex is valid"))
}

fn label_amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[0-9]+(?:[.,][0-9]+)*").expect("label amount regex is valid")
    })
}

/// Value encoded in a code ending in `<digits>OFF`, e.g. `GMKEVO50OFF` → 50
pub fn code_value(code: &str) -> Option<f64> {
    off_suffix_pattern()
        .captures(code)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Infer a discount from coupon UI text such as "Apply 100 € coupon" or "Save 10%".
///
/// A percent sign wins over a currency marker when a label carries both.
/// Labels with neither marker, or without a positive number, yield `None`.
///
/// The amount goes through [`parse_price`] and inherits its separator rules:
/// a lone dot is decimal, so "1.000 €" is worth 1, while "1.000,00 €" and
/// "1,000 €" are worth 1000.
pub fn classify_label(label: &str) -> Option<CouponCandidate> {
    let text = label.trim();
    let upper = text.to_uppercase();

    let kind = if text.contains('%') {
        DiscountKind::Percentage
    } else if text.contains(['€', '$', '£']) || upper.contains("EUR") || upper.contains("USD") {
        DiscountKind::Fixed
    } else {
        return None;
    };

    let value = label_amount_pattern()
        .find(text)
        .and_then(|m| parse_price(m.as_str()))
        .filter(|v| *v > 0.0)?;

    Some(CouponCandidate {
        code: text.to_string(),
        value,
        kind,
    })
}

/// Applies coupon heuristics to a base price
#[derive(Debug, Clone)]
pub struct CouponResolver {
    pattern: CouponPattern,
}

impl CouponResolver {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: CouponPattern::new(prefix)?,
        })
    }

    pub fn pattern(&self) -> &CouponPattern {
        &self.pattern
    }

    /// Page-level codes are currency amounts by convention; codes without an
    /// `OFF` value are kept with a zero value so they still get reported.
    pub fn page_candidates(&self, page_text: &str) -> Vec<CouponCandidate> {
        self.pattern
            .find_codes(page_text)
            .into_iter()
            .map(|code| {
                let value = code_value(&code).unwrap_or(0.0);
                CouponCandidate {
                    code,
                    value,
                    kind: DiscountKind::Fixed,
                }
            })
            .collect()
    }

    /// Combine candidates into one discount.
    ///
    /// Percentages are summed and applied to the base price first (rounded to
    /// cents), then the summed fixed amounts are added on top.
    pub fn resolve(&self, base_price: f64, candidates: &[CouponCandidate]) -> DiscountResolution {
        let percent: f64 = candidates
            .iter()
            .filter(|c| c.kind == DiscountKind::Percentage)
            .map(|c| c.value)
            .sum();
        let fixed: f64 = candidates
            .iter()
            .filter(|c| c.kind == DiscountKind::Fixed)
            .map(|c| c.value)
            .sum();

        let percent_amount = round_to_cents(base_price * percent / 100.0);

        DiscountResolution {
            base_price,
            discount_amount: round_to_cents(percent_amount + fixed),
            codes: candidates.iter().map(|c| c.code.clone()).collect(),
        }
    }

    pub fn resolve_page(&self, base_price: f64, page_text: &str) -> DiscountResolution {
        self.resolve(base_price, &self.page_candidates(page_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gmk() -> CouponPattern {
        CouponPattern::new("GMK").unwrap()
    }

    #[test]
    fn test_coupon_regex_matches_expected_patterns() {
        let codes = gmk().find_codes("This text contains GMKCODE1 and GMK20OFF inside.");
        assert_eq!(codes, vec!["GMKCODE1", "GMK20OFF"]);
    }

    #[test]
    fn test_coupon_regex_ignores_non_matches() {
        assert!(gmk().find_codes("This text has no codes, only regular words.").is_empty());
    }

    #[test]
    fn test_coupon_regex_boundaries() {
        assert!(gmk().find_codes("GMK").is_empty());
        assert_eq!(gmk().find_codes("GMK1"), vec!["GMK1"]);
        assert_eq!(gmk().find_codes("Save with GMKEVO50OFF today!"), vec!["GMKEVO50OFF"]);
    }

    #[test]
    fn test_find_codes_deduplicates_in_order() {
        let codes = gmk().find_codes("GMKB10OFF, GMKA5OFF, then GMKB10OFF again");
        assert_eq!(codes, vec!["GMKB10OFF", "GMKA5OFF"]);
    }

    #[test]
    fn test_prefix_is_literal() {
        let pattern = CouponPattern::new("SAVE.").unwrap();
        assert!(pattern.find_codes("SAVEX10").is_empty());
        assert_eq!(pattern.find_codes("SAVE.10"), vec!["SAVE.10"]);
    }

    #[test]
    fn test_code_value() {
        assert_eq!(code_value("GMKEVO50OFF"), Some(50.0));
        assert_eq!(code_value("GMK20OFF"), Some(20.0));
        assert_eq!(code_value("GMKCODE1"), None);
        assert_eq!(code_value("GMKOFF"), None);
    }

    #[test]
    fn test_classify_label() {
        let fixed = classify_label("Aplicar cupón de 100 €").unwrap();
        assert_eq!(fixed.kind, DiscountKind::Fixed);
        assert_eq!(fixed.value, 100.0);

        let pct = classify_label("Ahorra un 10%").unwrap();
        assert_eq!(pct.kind, DiscountKind::Percentage);
        assert_eq!(pct.value, 10.0);

        let both = classify_label("Save 5% (up to 50 €)").unwrap();
        assert_eq!(both.kind, DiscountKind::Percentage);
        assert_eq!(both.value, 5.0);

        assert!(classify_label("Coupon available").is_none());
        assert!(classify_label("Save %").is_none());
    }

    #[test]
    fn test_label_amounts_follow_price_separators() {
        assert_eq!(classify_label("Aplicar cupón de 1.000 €").unwrap().value, 1.0);
        assert_eq!(classify_label("Aplicar cupón de 1.000,00 €").unwrap().value, 1000.0);
        assert_eq!(classify_label("Apply 1,000 € coupon").unwrap().value, 1000.0);
        assert_eq!(classify_label("Ahorra un 7,5%").unwrap().value, 7.5);
    }

    #[test]
    fn test_page_codes_sum_as_fixed_amounts() {
        let resolver = CouponResolver::new("GMK").unwrap();
        let resolution = resolver.resolve_page(1700.0, "Use GMKEVO50OFF or GMK50OFF, also GMKWELCOME");

        assert_eq!(resolution.discount_amount, 100.0);
        assert_eq!(resolution.final_price(), 1600.0);
        assert_eq!(resolution.codes, vec!["GMKEVO50OFF", "GMK50OFF", "GMKWELCOME"]);
    }

    #[test]
    fn test_percentage_applies_before_fixed() {
        let resolver = CouponResolver::new("GMK").unwrap();
        let candidates = vec![
            CouponCandidate { code: "A".into(), value: 10.0, kind: DiscountKind::Percentage },
            CouponCandidate { code: "B".into(), value: 100.0, kind: DiscountKind::Fixed },
        ];
        let resolution = resolver.resolve(2000.0, &candidates);

        // 10% of 2000 plus 100 fixed
        assert_eq!(resolution.discount_amount, 300.0);
        assert_eq!(resolution.final_price(), 1700.0);
    }

    #[test]
    fn test_percentage_rounds_to_cents() {
        let resolver = CouponResolver::new("GMK").unwrap();
        let candidates = vec![CouponCandidate {
            code: "Save 7%".into(),
            value: 7.0,
            kind: DiscountKind::Percentage,
        }];
        let resolution = resolver.resolve(999.99, &candidates);
        assert_eq!(resolution.discount_amount, 70.0);
    }

    #[test]
    fn test_negative_final_price_is_not_clamped() {
        let resolver = CouponResolver::new("GMK").unwrap();
        let resolution = resolver.resolve_page(40.0, "GMK50OFF");
        assert_eq!(resolution.final_price(), -10.0);
    }

    #[test]
    fn test_no_coupons_means_no_discount() {
        let resolver = CouponResolver::new("GMK").unwrap();
        let resolution = resolver.resolve_page(1700.0, "plain page");
        assert_eq!(resolution.discount_amount, 0.0);
        assert!(resolution.codes.is_empty());
        assert_eq!(resolution.to_metadata().base_price, 1700.0);
    }
}
