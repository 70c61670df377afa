use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::{Extraction, PriceStrategy, StrategySettings};
use crate::domain::coupon::{classify_label, CouponCandidate, CouponResolver};
use crate::domain::price::parse_price;
use crate::infrastructure::browser::PageView;
use crate::shared::errors::ScrapeError;
use crate::shared::types::{ScrapeTarget, StrategyKind};

/// Price locators, most specific first
pub const PRICE_LOCATORS: [&str; 4] = [
    "#corePrice_feature_div .a-price .a-offscreen",
    "#corePriceDisplay_desktop_feature_div .a-price .a-offscreen",
    "#price_inside_buybox",
    ".a-price .a-offscreen",
];

/// Clippable coupon badges next to the buy box
pub const COUPON_LABEL_LOCATOR: &str =
    "#promoPriceBlockMessage_feature_div label, #couponBadgeRegularVpc, label[id^='couponText'], .couponLabelText";

/// Marketplace product page: fixed price locators plus coupon badges
pub struct MarketplaceStrategy {
    settings: StrategySettings,
    coupons: Arc<CouponResolver>,
}

impl MarketplaceStrategy {
    pub fn new(settings: StrategySettings, coupons: Arc<CouponResolver>) -> Self {
        Self { settings, coupons }
    }

    async fn base_price(&self, view: &dyn PageView) -> Result<Option<f64>, ScrapeError> {
        for locator in PRICE_LOCATORS {
            let Some(text) = view.query_text(locator).await? else { continue };
            if let Some(price) = parse_price(text.trim()) {
                debug!("Base price {} from {}", price, locator);
                return Ok(Some(price));
            }
        }
        Ok(None)
    }

    /// Visible badges classified by unit marker; repeated badges count once
    async fn coupon_candidates(&self, view: &dyn PageView) -> Result<Vec<CouponCandidate>, ScrapeError> {
        let labels = view.query_all(COUPON_LABEL_LOCATOR).await?;
        let mut seen = HashSet::new();
        Ok(labels
            .into_iter()
            .filter(|label| label.visible)
            .filter_map(|label| classify_label(&label.text))
            .filter(|candidate| seen.insert(candidate.code.clone()))
            .collect())
    }
}

#[async_trait]
impl PriceStrategy for MarketplaceStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Marketplace
    }

    async fn extract(
        &self,
        view: &mut dyn PageView,
        target: &ScrapeTarget,
    ) -> Result<Extraction, ScrapeError> {
        view.navigate(&target.url, self.settings.navigation_timeout).await?;

        let base_price = self
            .base_price(view)
            .await?
            .ok_or_else(|| ScrapeError::ParseFailure(target.url.clone()))?;

        let candidates = self.coupon_candidates(view).await?;
        let resolution = self.coupons.resolve(base_price, &candidates);

        Ok(Extraction {
            price: Some(resolution.final_price()),
            metadata: Some(resolution.to_metadata()),
        })
    }
}
