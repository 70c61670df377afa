//! Application services and use cases

use chrono::NaiveDateTime;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::evaluator::{EvaluationOutcome, TargetEvaluator};
use crate::application::orchestrator::{ScrapeBatch, ScrapeOrchestrator};
use crate::application::report::RunReport;
use crate::application::strategies::{StrategyFactory, StrategySettings};
use crate::domain::coupon::CouponResolver;
use crate::domain::history::{HistoryCompactor, LowestPrice, PriceHistory};
use crate::infrastructure::alerts::{create_alert_sink, AlertSink, LogAlertSink};
use crate::infrastructure::browser::{ChromiumSession, PageSession};
use crate::infrastructure::storage::JsonHistoryStore;
use crate::shared::config::{ConfigLoader, Settings};
use crate::shared::errors::{AppError, ConfigError};
use crate::shared::types::{PriceObservation, ScrapeTarget};
use crate::shared::utils::local_now;

/// Load targets, scrape, merge, compact, persist
pub struct PriceTrackingService {
    settings: Settings,
    store: JsonHistoryStore,
    compactor: HistoryCompactor,
}

impl PriceTrackingService {
    pub fn new(settings: Settings) -> Self {
        let store = JsonHistoryStore::new(settings.history_file.clone());
        let compactor = HistoryCompactor::new(settings.history.retention_days);
        Self { settings, store, compactor }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn targets_file(&self) -> &Path {
        &self.settings.targets_file
    }

    /// One full pass with a freshly launched browser.
    ///
    /// Only an unreadable target list fails the run. With no active targets
    /// the browser is never started and the history is left alone. A browser
    /// that cannot start skips every target, and compaction still runs.
    pub async fn run_once(&self, now: NaiveDateTime) -> Result<RunReport, AppError> {
        let targets = ConfigLoader::load_targets(&self.settings.targets_file)?;
        if targets.is_empty() {
            info!("⏳ No active targets to scrape");
            let mut report = RunReport::new(now);
            report.history_before = self.store.load().len();
            report.history_after = report.history_before;
            report.finished_at = local_now();
            return Ok(report);
        }

        let alerts = match create_alert_sink(&self.settings.alerts) {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!("Alert sink unavailable, logging drops instead: {}", e);
                Arc::new(LogAlertSink)
            }
        };

        let session = match ChromiumSession::launch(&self.settings.scrape).await {
            Ok(session) => Arc::new(session),
            Err(e) => {
                error!("❌ {}", e);
                let batch = ScrapeBatch {
                    outcomes: targets.iter().map(|t| EvaluationOutcome::skipped(t, &e)).collect(),
                };
                return self.finish(RunReport::new(now), self.store.load(), &batch, now);
            }
        };

        let result = self.run_with_session(&targets, session.clone(), alerts, now).await;

        if let Err(e) = session.shutdown().await {
            warn!("Browser shutdown failed: {}", e);
        }
        result
    }

    /// Scrape `targets` through an existing session and persist the outcome
    pub async fn run_with_session(
        &self,
        targets: &[ScrapeTarget],
        session: Arc<dyn PageSession>,
        alerts: Arc<dyn AlertSink>,
        now: NaiveDateTime,
    ) -> Result<RunReport, AppError> {
        let report = RunReport::new(now);
        let history = self.store.load();

        let evaluator = Arc::new(self.build_evaluator(alerts)?);
        let orchestrator = ScrapeOrchestrator::new(session, evaluator, self.settings.scrape.concurrency);
        let batch = orchestrator.run(targets).await;

        self.finish(report, history, &batch, now)
    }

    fn finish(
        &self,
        mut report: RunReport,
        history: PriceHistory,
        batch: &ScrapeBatch,
        now: NaiveDateTime,
    ) -> Result<RunReport, AppError> {
        report.history_before = history.len();
        report.record_batch(batch);

        let (next, saved) = self.persist(history, batch.observations(), now)?;
        report.history_after = next.len();
        report.saved = saved;
        report.finished_at = local_now();

        info!("✅ Run {} finished: {}", report.run_id, report.summary());
        Ok(report)
    }

    /// Compact the stored history in place; returns (before, after)
    pub fn compact_only(&self, now: NaiveDateTime) -> Result<(usize, usize), AppError> {
        let history = self.store.load();
        let before = history.len();
        let (next, saved) = self.persist(history, Vec::new(), now)?;
        if saved {
            info!("🧹 Compacted {}: {} -> {} records", self.store.path().display(), before, next.len());
        } else {
            info!("History already compact ({} records)", before);
        }
        Ok((before, next.len()))
    }

    pub fn lowest(&self, site: Option<&str>, variant: Option<&str>) -> Vec<LowestPrice> {
        self.store.load().lowest(site, variant)
    }

    pub fn latest(&self) -> Vec<PriceObservation> {
        self.store
            .load()
            .latest_per_target()
            .into_iter()
            .cloned()
            .collect()
    }

    fn build_evaluator(&self, alerts: Arc<dyn AlertSink>) -> Result<TargetEvaluator, AppError> {
        let coupons = CouponResolver::new(&self.settings.coupons.prefix)
            .map_err(|e| ConfigError::Invalid(format!("coupon prefix: {}", e)))?;
        let factory = StrategyFactory::new(StrategySettings::from(&self.settings), Arc::new(coupons));
        Ok(TargetEvaluator::new(&factory, alerts))
    }

    /// Merge and compact; write only when there is something new
    fn persist(
        &self,
        history: PriceHistory,
        observations: Vec<PriceObservation>,
        now: NaiveDateTime,
    ) -> Result<(PriceHistory, bool), AppError> {
        let had_observations = !observations.is_empty();
        let previous = if had_observations { None } else { Some(history.clone()) };

        let next = self.compactor.merge(history, observations, now);
        let changed = had_observations || previous.as_ref() != Some(&next);
        if changed {
            self.store.save(&next)?;
        }
        Ok((next, changed))
    }
}
