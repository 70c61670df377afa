//! Target evaluation - one target, one observation or one skip

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::strategies::{PriceStrategy, StrategyFactory};
use crate::infrastructure::alerts::{AlertSink, PriceDrop};
use crate::infrastructure::browser::PageView;
use crate::shared::errors::ScrapeError;
use crate::shared::types::{PriceObservation, ScrapeTarget, StrategyKind};
use crate::shared::utils::{format_price, local_now};

/// What happened to the price-drop signal for an observation
#[derive(Debug, Clone, PartialEq)]
pub enum AlertStatus {
    NotTriggered,
    Sent,
    Failed(String),
}

/// A target that produced no observation this run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTarget {
    pub site: String,
    pub variant: String,
    pub url: String,
    pub kind: &'static str,
    pub reason: String,
}

impl SkippedTarget {
    pub fn new(target: &ScrapeTarget, error: &ScrapeError) -> Self {
        Self {
            site: target.site_name.clone(),
            variant: target.variant.clone(),
            url: target.url.clone(),
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Observed {
        observation: PriceObservation,
        alert: AlertStatus,
    },
    Skipped(SkippedTarget),
}

impl EvaluationOutcome {
    pub fn skipped(target: &ScrapeTarget, error: &ScrapeError) -> Self {
        warn!(
            site = %target.site_name,
            variant = %target.variant,
            reason = error.kind(),
            "⚠️  Skipping {}: {}", target.label(), error
        );
        EvaluationOutcome::Skipped(SkippedTarget::new(target, error))
    }
}

/// Runs the target's strategy and raises price-drop alerts
pub struct TargetEvaluator {
    strategies: HashMap<StrategyKind, Box<dyn PriceStrategy>>,
    alerts: Arc<dyn AlertSink>,
}

impl TargetEvaluator {
    pub fn new(factory: &StrategyFactory, alerts: Arc<dyn AlertSink>) -> Self {
        let strategies = StrategyFactory::available_kinds()
            .into_iter()
            .map(|kind| (kind, factory.create(kind)))
            .collect();
        Self { strategies, alerts }
    }

    /// Never fails: fetch and parse errors come back as `Skipped`
    pub async fn evaluate(&self, view: &mut dyn PageView, target: &ScrapeTarget) -> EvaluationOutcome {
        let strategy = match target.strategy_kind().and_then(|kind| self.strategies.get(&kind)) {
            Some(strategy) => strategy,
            None => {
                let err = ScrapeError::ElementNotFound("no selector or strategy configured".into());
                return EvaluationOutcome::skipped(target, &err);
            }
        };

        debug!("Evaluating {} with {} strategy", target.label(), strategy.kind().as_str());
        let extraction = match strategy.extract(view, target).await {
            Ok(extraction) => extraction,
            Err(e) => return EvaluationOutcome::skipped(target, &e),
        };

        let mut observation = PriceObservation::new(target, local_now(), extraction.price);
        if let Some(metadata) = extraction.metadata {
            observation = observation.with_discount(metadata);
        }
        info!("💰 {} -> {}", target.label(), format_price(observation.price));

        let alert = self.signal(target, &observation).await;
        EvaluationOutcome::Observed { observation, alert }
    }

    async fn signal(&self, target: &ScrapeTarget, observation: &PriceObservation) -> AlertStatus {
        let Some(drop) = PriceDrop::detect(target, observation) else {
            return AlertStatus::NotTriggered;
        };

        match self.alerts.notify_price_drop(&drop).await {
            Ok(()) => AlertStatus::Sent,
            Err(e) => {
                warn!("❌ Alert for {} not delivered: {}", target.label(), e);
                AlertStatus::Failed(e.to_string())
            }
        }
    }
}
