use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{Extraction, PriceStrategy, StrategySettings};
use crate::domain::coupon::CouponResolver;
use crate::domain::price::resolve_base_price;
use crate::infrastructure::browser::{PageElement, PageView};
use crate::shared::errors::ScrapeError;
use crate::shared::types::{ScrapeTarget, StrategyKind};
use crate::shared::utils::normalize_label;

/// Clickable variant selectors on a store product page
pub const VARIANT_CONTROL_LOCATOR: &str =
    "[data-option-value], .variant-option, .swatch-element label, input[type='radio'] + label, select option";

/// Main content area the fallback price scan is restricted to
pub const MAIN_CONTENT_LOCATOR: &str = "main";

const DISMISS_OVERLAYS_SCRIPT: &str = r#"(() => {
    const selectors = [
        '[role="dialog"]', '.modal', '.popup', '.overlay', '.newsletter',
        '#onetrust-banner-sdk', '.cookie-banner', '[class*="cookie"]'
    ];
    let removed = 0;
    for (const sel of selectors) {
        document.querySelectorAll(sel).forEach(el => { el.remove(); removed++; });
    }
    document.body.style.overflow = 'auto';
    return removed;
})()"#;

/// Pick the control for `variant`: visible label first, form value second
pub fn pick_variant<'a>(controls: &'a [PageElement], variant: &str) -> Option<&'a PageElement> {
    let wanted = normalize_label(variant);
    if wanted.is_empty() {
        return None;
    }

    controls
        .iter()
        .filter(|c| c.visible)
        .find(|c| normalize_label(&c.text).contains(&wanted))
        .or_else(|| {
            controls.iter().find(|c| {
                c.value
                    .as_deref()
                    .is_some_and(|v| normalize_label(v).contains(&wanted))
            })
        })
}

/// Official store page with selectable variants and page-level coupon codes
pub struct StorefrontStrategy {
    settings: StrategySettings,
    coupons: Arc<CouponResolver>,
}

impl StorefrontStrategy {
    pub fn new(settings: StrategySettings, coupons: Arc<CouponResolver>) -> Self {
        Self { settings, coupons }
    }

    async fn dismiss_overlays(&self, view: &dyn PageView, target: &ScrapeTarget) {
        match view.evaluate_script(DISMISS_OVERLAYS_SCRIPT).await {
            Ok(removed) => debug!("Removed {} overlay elements on {}", removed, target.label()),
            Err(e) => warn!("Overlay removal failed on {}: {}", target.label(), e),
        }
    }

    async fn select_variant(&self, view: &dyn PageView, target: &ScrapeTarget) -> Result<(), ScrapeError> {
        let controls = view.query_all(VARIANT_CONTROL_LOCATOR).await?;
        let control = pick_variant(&controls, &target.variant).ok_or_else(|| {
            ScrapeError::ElementNotFound(format!("variant control for {:?}", target.variant))
        })?;

        debug!("Selecting variant {:?} via {:?}", target.variant, control.text);
        view.click(control).await?;
        tokio::time::sleep(self.settings.variant_settle).await;
        Ok(())
    }

    async fn content_text(&self, view: &dyn PageView) -> Result<String, ScrapeError> {
        match view.query_text(MAIN_CONTENT_LOCATOR).await? {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => view.page_text().await,
        }
    }
}

#[async_trait]
impl PriceStrategy for StorefrontStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Storefront
    }

    async fn extract(
        &self,
        view: &mut dyn PageView,
        target: &ScrapeTarget,
    ) -> Result<Extraction, ScrapeError> {
        view.navigate(&target.url, self.settings.navigation_timeout).await?;
        self.dismiss_overlays(view, target).await;
        self.select_variant(view, target).await?;

        let content = self.content_text(view).await?;
        let base_price = resolve_base_price(&content, self.settings.min_sane_price)
            .ok_or_else(|| ScrapeError::ParseFailure(target.url.clone()))?;

        let page_text = view.page_text().await?;
        let resolution = self.coupons.resolve_page(base_price, &page_text);
        if !resolution.codes.is_empty() {
            debug!("Coupons on {}: {:?}", target.label(), resolution.codes);
        }

        Ok(Extraction {
            price: Some(resolution.final_price()),
            metadata: Some(resolution.to_metadata()),
        })
    }
}
