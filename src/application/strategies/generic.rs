use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Extraction, PriceStrategy, StrategySettings};
use crate::domain::price::parse_price;
use crate::infrastructure::browser::PageView;
use crate::shared::errors::ScrapeError;
use crate::shared::types::{ScrapeTarget, StrategyKind};

/// One selector yields one text snippet
pub struct GenericStrategy {
    settings: StrategySettings,
}

impl GenericStrategy {
    pub fn new(settings: StrategySettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl PriceStrategy for GenericStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Generic
    }

    async fn extract(
        &self,
        view: &mut dyn PageView,
        target: &ScrapeTarget,
    ) -> Result<Extraction, ScrapeError> {
        let selector = target
            .selector
            .as_deref()
            .ok_or_else(|| ScrapeError::ElementNotFound("no selector configured".into()))?;

        view.navigate(&target.url, self.settings.navigation_timeout).await?;
        view.wait_for_element(selector, self.settings.selector_timeout).await?;

        let text = view
            .query_text(selector)
            .await?
            .ok_or_else(|| ScrapeError::ElementNotFound(selector.to_string()))?;

        let price = parse_price(&text);
        match price {
            Some(value) => debug!("Found price {} (raw: {:?}) for {}", value, text, target.label()),
            // kept as a null-price observation for the audit trail
            None => warn!("No numeric price in {:?} for {}", text, target.label()),
        }

        Ok(Extraction { price, metadata: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakePage, FakeSession};
    use crate::infrastructure::browser::PageSession;

    fn target() -> ScrapeTarget {
        ScrapeTarget {
            url: "https://shop.example/p".into(),
            variant: "96GB".into(),
            site_name: "Shop".into(),
            selector: Some(".price".into()),
            strategy: None,
            target_price: None,
            active: true,
        }
    }

    async fn extract(page: FakePage) -> Result<Extraction, ScrapeError> {
        let session = FakeSession::new().with_page("https://shop.example/p", page);
        let mut view = session.open_view().await.unwrap();
        GenericStrategy::new(StrategySettings::default())
            .extract(view.as_mut(), &target())
            .await
    }

    #[tokio::test]
    async fn test_generic_reads_selector_text() {
        let result = extract(FakePage::new().with_text(".price", "1.234,56 €")).await.unwrap();
        assert_eq!(result.price, Some(1234.56));
        assert!(result.metadata.is_none());
    }

    #[tokio::test]
    async fn test_generic_unparseable_text_is_null_price() {
        let result = extract(FakePage::new().with_text(".price", "Agotado")).await.unwrap();
        assert_eq!(result.price, None);
    }

    #[tokio::test]
    async fn test_generic_missing_selector_is_not_found() {
        let err = extract(FakePage::new().with_text(".other", "1,00")).await.unwrap_err();
        assert!(matches!(err, ScrapeError::ElementNotFound(s) if s == ".price"));
    }
}
