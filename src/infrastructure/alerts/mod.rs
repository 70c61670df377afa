//! Alert delivery - price drop notifications

mod log_sink;
mod webhook;

pub use log_sink::LogAlertSink;
pub use webhook::WebhookAlertSink;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::shared::config::AlertSettings;
use crate::shared::errors::AlertError;
use crate::shared::types::{PriceObservation, ScrapeTarget};

/// A price at or below a target's threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDrop {
    pub site: String,
    pub variant: String,
    pub url: String,
    pub price: f64,
    pub target_price: f64,
    pub base_price: Option<f64>,
    pub discount_applied: Option<f64>,
    #[serde(default)]
    pub coupon_codes: Vec<String>,
    pub timestamp: NaiveDateTime,
}

impl PriceDrop {
    /// `None` unless the target has a threshold and the observed price meets it
    pub fn detect(target: &ScrapeTarget, observation: &PriceObservation) -> Option<Self> {
        let threshold = target.target_price?;
        let price = observation.price?;
        if price > threshold {
            return None;
        }

        let metadata = observation.metadata.as_ref();
        Some(Self {
            site: observation.site.clone(),
            variant: observation.variant.clone(),
            url: observation.url.clone(),
            price,
            target_price: threshold,
            base_price: metadata.map(|m| m.base_price),
            discount_applied: metadata.map(|m| m.discount_applied),
            coupon_codes: metadata.map(|m| m.coupons_found.clone()).unwrap_or_default(),
            timestamp: observation.timestamp,
        })
    }
}

/// Receives price drop notifications; delivery is best effort
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify_price_drop(&self, drop: &PriceDrop) -> Result<(), AlertError>;
}

/// Webhook sink when a URL is configured, log-only otherwise
pub fn create_alert_sink(settings: &AlertSettings) -> Result<Arc<dyn AlertSink>, AlertError> {
    match &settings.webhook_url {
        Some(url) => Ok(Arc::new(WebhookAlertSink::new(url.clone(), settings.timeout_ms)?)),
        None => Ok(Arc::new(LogAlertSink)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::ObservationMetadata;
    use chrono::NaiveDate;

    fn target(target_price: Option<f64>) -> ScrapeTarget {
        ScrapeTarget {
            url: "https://shop.example/p".into(),
            variant: "96GB".into(),
            site_name: "Shop".into(),
            selector: Some(".price".into()),
            strategy: None,
            target_price,
            active: true,
        }
    }

    fn observation(price: Option<f64>) -> PriceObservation {
        let timestamp = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        PriceObservation::new(&target(None), timestamp, price)
    }

    #[test]
    fn test_detect_at_or_below_threshold() {
        assert!(PriceDrop::detect(&target(Some(1500.0)), &observation(Some(1500.0))).is_some());
        assert!(PriceDrop::detect(&target(Some(1500.0)), &observation(Some(1499.0))).is_some());
        assert!(PriceDrop::detect(&target(Some(1500.0)), &observation(Some(1500.01))).is_none());
    }

    #[test]
    fn test_detect_needs_threshold_and_price() {
        assert!(PriceDrop::detect(&target(None), &observation(Some(1.0))).is_none());
        assert!(PriceDrop::detect(&target(Some(1500.0)), &observation(None)).is_none());
    }

    #[test]
    fn test_detect_carries_metadata() {
        let obs = observation(None).with_discount(ObservationMetadata {
            base_price: 1700.0,
            discount_applied: 100.0,
            coupons_found: vec!["GMK100OFF".into()],
        });
        let drop = PriceDrop::detect(&target(Some(1650.0)), &obs).unwrap();
        assert_eq!(drop.price, 1600.0);
        assert_eq!(drop.base_price, Some(1700.0));
        assert_eq!(drop.discount_applied, Some(100.0));
        assert_eq!(drop.coupon_codes, vec!["GMK100OFF"]);
    }
}
