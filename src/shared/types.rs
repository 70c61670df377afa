//! Common types used across the application

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Price extraction strategy for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// One selector, one text snippet
    Generic,
    /// Official store page with variant controls and coupon codes in page text
    Storefront,
    /// Marketplace product page with coupon labels next to the buy box
    Marketplace,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Generic => "generic",
            StrategyKind::Storefront => "storefront",
            StrategyKind::Marketplace => "marketplace",
        }
    }
}

fn default_active() -> bool {
    true
}

/// One (site, URL, variant) tuple to observe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeTarget {
    pub url: String,
    #[serde(alias = "target_ram")]
    pub variant: String,
    pub site_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl ScrapeTarget {
    /// Explicit strategy tag, or `Generic` when only a selector is configured
    pub fn strategy_kind(&self) -> Option<StrategyKind> {
        self.strategy
            .or_else(|| self.selector.as_ref().map(|_| StrategyKind::Generic))
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.site_name, self.variant)
    }
}

/// Discount breakdown kept next to the final price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationMetadata {
    pub base_price: f64,
    pub discount_applied: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coupons_found: Vec<String>,
}

/// One timestamped price record for a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Local evaluation time, ISO-8601 without offset
    pub timestamp: NaiveDateTime,
    pub variant: String,
    pub site: String,
    /// Final price after discount; `None` when the page text held no number
    pub price: Option<f64>,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObservationMetadata>,
}

impl PriceObservation {
    pub fn new(target: &ScrapeTarget, timestamp: NaiveDateTime, price: Option<f64>) -> Self {
        Self {
            timestamp,
            variant: target.variant.clone(),
            site: target.site_name.clone(),
            price,
            url: target.url.clone(),
            metadata: None,
        }
    }

    /// Attach a discount breakdown; the final price becomes `base - discount`.
    pub fn with_discount(mut self, metadata: ObservationMetadata) -> Self {
        self.price = Some(metadata.base_price - metadata.discount_applied);
        self.metadata = Some(metadata);
        self
    }
}
