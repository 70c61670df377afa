//! Per-run summary

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::application::evaluator::SkippedTarget;
use crate::application::orchestrator::ScrapeBatch;
use crate::shared::utils::generate_id;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub targets_attempted: usize,
    pub observations_recorded: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
    pub skipped: Vec<SkippedTarget>,
    pub history_before: usize,
    pub history_after: usize,
    /// Whether the history file was rewritten
    pub saved: bool,
}

impl RunReport {
    pub fn new(started_at: NaiveDateTime) -> Self {
        Self {
            run_id: generate_id(),
            started_at,
            finished_at: started_at,
            targets_attempted: 0,
            observations_recorded: 0,
            alerts_sent: 0,
            alerts_failed: 0,
            skipped: Vec::new(),
            history_before: 0,
            history_after: 0,
            saved: false,
        }
    }

    pub fn record_batch(&mut self, batch: &ScrapeBatch) {
        let (sent, failed) = batch.alert_counts();
        self.targets_attempted = batch.outcomes.len();
        self.observations_recorded = batch.observations().len();
        self.alerts_sent = sent;
        self.alerts_failed = failed;
        self.skipped = batch.skipped();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One-line summary for the log
    pub fn summary(&self) -> String {
        format!(
            "{} targets, {} observed, {} skipped, {} alerts, history {} -> {}",
            self.targets_attempted,
            self.observations_recorded,
            self.skipped.len(),
            self.alerts_sent,
            self.history_before,
            self.history_after,
        )
    }
}
