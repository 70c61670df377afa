//! Error handling for the application

use thiserror::Error;

/// Page fetching and price extraction errors.
///
/// All of these stop at the evaluator boundary and turn into a skipped target.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScrapeError {
    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    FetchTimeout { what: String, timeout_ms: u64 },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("No numeric price in {0:?}")]
    ParseFailure(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Browser error: {0}")]
    Browser(String),
}

/// Alert delivery errors
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Alert delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Alert endpoint rejected the notification with status {0}")]
    Rejected(u16),
}

/// History persistence errors
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History file is corrupt: {0}")]
    Corrupt(String),

    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("History serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("History error: {0}")]
    HistoryError(String),

    #[error("Browser error: {0}")]
    BrowserError(String),

    #[error("Alert error: {0}")]
    AlertError(String),

    #[error("Report error: {0}")]
    ReportError(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        AppError::HistoryError(err.to_string())
    }
}

impl From<ScrapeError> for AppError {
    fn from(err: ScrapeError) -> Self {
        AppError::BrowserError(err.to_string())
    }
}

impl From<AlertError> for AppError {
    fn from(err: AlertError) -> Self {
        AppError::AlertError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ReportError(err.to_string())
    }
}

impl ScrapeError {
    /// Short machine-friendly name used in run reports
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::FetchTimeout { .. } => "fetch_timeout",
            ScrapeError::ElementNotFound(_) => "element_not_found",
            ScrapeError::ParseFailure(_) => "parse_failure",
            ScrapeError::Navigation(_) => "navigation",
            ScrapeError::Script(_) => "script",
            ScrapeError::Browser(_) => "browser",
        }
    }
}
