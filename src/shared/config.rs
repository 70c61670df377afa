//! Settings and target list loading

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::shared::errors::ConfigError;
use crate::shared::types::{ScrapeTarget, StrategyKind};

pub const DEFAULT_SETTINGS_FILE: &str = "pricewatch.toml";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Browser and concurrency settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    pub concurrency: usize,
    pub navigation_timeout_ms: u64,
    pub selector_timeout_ms: u64,
    pub user_agent: String,
    pub chromium_path: Option<PathBuf>,
    pub headless: bool,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            concurrency: 5,
            navigation_timeout_ms: 60_000,
            selector_timeout_ms: 10_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chromium_path: None,
            headless: true,
        }
    }
}

/// History compaction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub retention_days: i64,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { retention_days: 14 }
    }
}

/// Coupon detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CouponSettings {
    /// Literal prefix every promotional code starts with
    pub prefix: String,
    /// Fallback price scan ignores amounts at or below this value
    pub min_sane_price: f64,
}

impl Default for CouponSettings {
    fn default() -> Self {
        Self {
            prefix: "GMK".to_string(),
            min_sane_price: 100.0,
        }
    }
}

/// Alert delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Absent means alerts only go to the log
    pub webhook_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_ms: 10_000,
        }
    }
}

/// Application settings, read from `pricewatch.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub targets_file: PathBuf,
    pub history_file: PathBuf,
    pub scrape: ScrapeSettings,
    pub history: HistorySettings,
    pub coupons: CouponSettings,
    pub alerts: AlertSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            targets_file: PathBuf::from("config.json"),
            history_file: PathBuf::from("data/prices.json"),
            scrape: ScrapeSettings::default(),
            history: HistorySettings::default(),
            coupons: CouponSettings::default(),
            alerts: AlertSettings::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scrape.concurrency == 0 {
            return Err(ConfigError::Invalid("scrape.concurrency must be at least 1".into()));
        }
        if self.history.retention_days < 0 {
            return Err(ConfigError::Invalid("history.retention_days must not be negative".into()));
        }
        if self.coupons.prefix.is_empty() {
            return Err(ConfigError::Invalid("coupons.prefix must not be empty".into()));
        }
        Ok(())
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from a TOML file.
    ///
    /// An explicit path must exist; the default path falls back to built-in
    /// defaults when the file is absent.
    pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
        };

        if !explicit && !path.exists() {
            info!("No {} found, using default settings", path.display());
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let settings = Self::parse_settings(&content).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;

        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn parse_settings(content: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: DEFAULT_SETTINGS_FILE.to_string(),
            reason: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load the ordered target list and keep only active entries.
    ///
    /// This is the one load failure that aborts a run.
    pub fn load_targets(path: &Path) -> Result<Vec<ScrapeTarget>, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let targets = Self::parse_targets(&content).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;

        let total = targets.len();
        let active: Vec<ScrapeTarget> = targets.into_iter().filter(|t| t.active).collect();
        info!("Loaded {} targets ({} active) from {}", total, active.len(), path.display());
        Ok(active)
    }

    pub fn parse_targets(content: &str) -> Result<Vec<ScrapeTarget>, ConfigError> {
        let targets: Vec<ScrapeTarget> =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                path: "targets".to_string(),
                reason: e.to_string(),
            })?;

        for target in &targets {
            match target.strategy_kind() {
                None => {
                    return Err(ConfigError::Invalid(format!(
                        "target {} needs a selector or a strategy",
                        target.label()
                    )))
                }
                Some(StrategyKind::Generic) if target.selector.is_none() => {
                    return Err(ConfigError::Invalid(format!(
                        "generic target {} needs a selector",
                        target.label()
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(targets)
    }
}
