//! Application layer - use cases and services
pub mod commands;
pub mod evaluator;
pub mod orchestrator;
pub mod report;
pub mod services;
pub mod strategies;

#[cfg(test)]
pub(crate) mod testing;

pub use commands::{Cli, CommandExecutor, Commands, GlobalArgs};
pub use evaluator::{AlertStatus, EvaluationOutcome, SkippedTarget, TargetEvaluator};
pub use orchestrator::{ScrapeBatch, ScrapeOrchestrator};
pub use report::RunReport;
pub use services::PriceTrackingService;
