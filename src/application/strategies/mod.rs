//! Price extraction strategies.
//!
//! A closed set selected by the target's strategy tag: `generic` reads one
//! selector, `storefront` and `marketplace` drive site-specific pages and
//! apply coupons.

mod generic;
mod storefront;
mod marketplace;

pub use generic::GenericStrategy;
pub use storefront::{pick_variant, StorefrontStrategy, MAIN_CONTENT_LOCATOR, VARIANT_CONTROL_LOCATOR};
pub use marketplace::{MarketplaceStrategy, COUPON_LABEL_LOCATOR, PRICE_LOCATORS};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::coupon::CouponResolver;
use crate::infrastructure::browser::PageView;
use crate::shared::config::Settings;
use crate::shared::errors::ScrapeError;
use crate::shared::types::{ObservationMetadata, ScrapeTarget, StrategyKind};

/// Timeouts and thresholds shared by all strategies
#[derive(Debug, Clone)]
pub struct StrategySettings {
    pub navigation_timeout: Duration,
    pub selector_timeout: Duration,
    pub min_sane_price: f64,
    /// Pause after clicking a variant control so the price can re-render
    pub variant_settle: Duration,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            selector_timeout: Duration::from_secs(10),
            min_sane_price: 100.0,
            variant_settle: Duration::from_millis(1500),
        }
    }
}

impl From<&Settings> for StrategySettings {
    fn from(settings: &Settings) -> Self {
        Self {
            navigation_timeout: Duration::from_millis(settings.scrape.navigation_timeout_ms),
            selector_timeout: Duration::from_millis(settings.scrape.selector_timeout_ms),
            min_sane_price: settings.coupons.min_sane_price,
            ..Self::default()
        }
    }
}

/// What a strategy read from the page
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Final price; `None` when the text held no number
    pub price: Option<f64>,
    pub metadata: Option<ObservationMetadata>,
}

/// Turns one page into one price
#[async_trait]
pub trait PriceStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn extract(
        &self,
        view: &mut dyn PageView,
        target: &ScrapeTarget,
    ) -> Result<Extraction, ScrapeError>;
}

/// Factory for creating strategies
pub struct StrategyFactory {
    settings: StrategySettings,
    coupons: Arc<CouponResolver>,
}

impl StrategyFactory {
    pub fn new(settings: StrategySettings, coupons: Arc<CouponResolver>) -> Self {
        Self { settings, coupons }
    }

    pub fn create(&self, kind: StrategyKind) -> Box<dyn PriceStrategy> {
        match kind {
            StrategyKind::Generic => Box::new(GenericStrategy::new(self.settings.clone())),
            StrategyKind::Storefront => Box::new(StorefrontStrategy::new(
                self.settings.clone(),
                Arc::clone(&self.coupons),
            )),
            StrategyKind::Marketplace => Box::new(MarketplaceStrategy::new(
                self.settings.clone(),
                Arc::clone(&self.coupons),
            )),
        }
    }

    pub fn available_kinds() -> Vec<StrategyKind> {
        vec![
            StrategyKind::Generic,
            StrategyKind::Storefront,
            StrategyKind::Marketplace,
        ]
    }
}
