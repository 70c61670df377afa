//! Bounded-concurrency scrape orchestration

use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::application::evaluator::{AlertStatus, EvaluationOutcome, SkippedTarget, TargetEvaluator};
use crate::infrastructure::browser::PageSession;
use crate::shared::errors::ScrapeError;
use crate::shared::types::{PriceObservation, ScrapeTarget};

/// Outcomes of one batch, in target order
#[derive(Debug, Clone, Default)]
pub struct ScrapeBatch {
    pub outcomes: Vec<EvaluationOutcome>,
}

impl ScrapeBatch {
    pub fn observations(&self) -> Vec<PriceObservation> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                EvaluationOutcome::Observed { observation, .. } => Some(observation.clone()),
                EvaluationOutcome::Skipped(_) => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> Vec<SkippedTarget> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                EvaluationOutcome::Skipped(skip) => Some(skip.clone()),
                EvaluationOutcome::Observed { .. } => None,
            })
            .collect()
    }

    /// (sent, failed)
    pub fn alert_counts(&self) -> (usize, usize) {
        self.outcomes.iter().fold((0, 0), |(sent, failed), outcome| match outcome {
            EvaluationOutcome::Observed { alert: AlertStatus::Sent, .. } => (sent + 1, failed),
            EvaluationOutcome::Observed { alert: AlertStatus::Failed(_), .. } => (sent, failed + 1),
            _ => (sent, failed),
        })
    }
}

/// Runs evaluations against a shared session, at most `width` at a time.
///
/// Every evaluation gets its own view; the view is closed on success, error
/// and panic alike. No delay is inserted between tasks.
pub struct ScrapeOrchestrator {
    session: Arc<dyn PageSession>,
    evaluator: Arc<TargetEvaluator>,
    admission: Arc<Semaphore>,
    width: usize,
}

impl ScrapeOrchestrator {
    pub fn new(session: Arc<dyn PageSession>, evaluator: Arc<TargetEvaluator>, width: usize) -> Self {
        let width = width.max(1);
        Self {
            session,
            evaluator,
            admission: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub async fn run(&self, targets: &[ScrapeTarget]) -> ScrapeBatch {
        info!("🔍 Scraping {} targets (concurrency {})", targets.len(), self.width);

        let handles: Vec<_> = targets
            .iter()
            .cloned()
            .map(|target| {
                let session = Arc::clone(&self.session);
                let evaluator = Arc::clone(&self.evaluator);
                let admission = Arc::clone(&self.admission);
                tokio::spawn(async move {
                    evaluate_isolated(session, evaluator, admission, &target).await
                })
            })
            .collect();

        let outcomes = join_all(handles)
            .await
            .into_iter()
            .zip(targets)
            .map(|(joined, target)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Evaluation task for {} aborted: {}", target.label(), e);
                    EvaluationOutcome::skipped(target, &ScrapeError::Browser(e.to_string()))
                }
            })
            .collect();

        ScrapeBatch { outcomes }
    }
}

async fn evaluate_isolated(
    session: Arc<dyn PageSession>,
    evaluator: Arc<TargetEvaluator>,
    admission: Arc<Semaphore>,
    target: &ScrapeTarget,
) -> EvaluationOutcome {
    let _permit = match admission.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => return EvaluationOutcome::skipped(target, &ScrapeError::Browser(e.to_string())),
    };

    let mut view = match session.open_view().await {
        Ok(view) => view,
        Err(e) => return EvaluationOutcome::skipped(target, &e),
    };
    debug!("Opened view for {} ({} open)", target.label(), session.open_views());

    let outcome = AssertUnwindSafe(evaluator.evaluate(view.as_mut(), target))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let msg = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            error!("Evaluation of {} panicked: {}", target.label(), msg);
            EvaluationOutcome::skipped(target, &ScrapeError::Browser(msg))
        });

    if let Err(e) = view.close().await {
        warn!("Failed to close view for {}: {}", target.label(), e);
    }
    outcome
}
