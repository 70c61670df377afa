use async_trait::async_trait;
use tracing::info;

use super::{AlertSink, PriceDrop};
use crate::shared::errors::AlertError;
use crate::shared::utils::format_price;

/// Writes price drops to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn notify_price_drop(&self, drop: &PriceDrop) -> Result<(), AlertError> {
        info!(
            site = %drop.site,
            variant = %drop.variant,
            price = drop.price,
            target_price = drop.target_price,
            base_price = %format_price(drop.base_price),
            "🚨 Price drop: {} ({}) at {:.2} (target {:.2}) {}",
            drop.site,
            drop.variant,
            drop.price,
            drop.target_price,
            drop.url
        );
        Ok(())
    }
}
