use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{AlertSink, PriceDrop};
use crate::shared::errors::AlertError;

/// POSTs each price drop as JSON to a webhook
pub struct WebhookAlertSink {
    client: Client,
    url: String,
}

impl WebhookAlertSink {
    pub fn new(url: String, timeout_ms: u64) -> Result<Self, AlertError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| AlertError::DeliveryFailed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn notify_price_drop(&self, drop: &PriceDrop) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.url)
            .json(drop)
            .send()
            .await
            .map_err(|e| AlertError::DeliveryFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Rejected(status.as_u16()));
        }

        debug!("Webhook accepted price drop for {} ({})", drop.site, drop.variant);
        Ok(())
    }
}
