//! CLI commands and handlers
use clap::{Args, Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::application::services::PriceTrackingService;
use crate::domain::price::parse_price;
use crate::shared::config::{ConfigLoader, Settings};
use crate::shared::errors::{AppError, ConfigError};
use crate::shared::utils::{format_price, local_now};

#[derive(Parser, Debug)]
#[command(name = "pricewatch")]
#[command(version, about = "Multi-site price tracker with coupon detection and history compaction")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides applied on top of the settings file
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Target list (JSON)
    #[arg(long, global = true)]
    pub targets: Option<PathBuf>,

    /// History file (JSON)
    #[arg(long, global = true)]
    pub history: Option<PathBuf>,

    /// Maximum concurrent page evaluations
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Log filter directive, e.g. "debug" or "pricewatch=trace"
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrape every active target once
    Run,

    /// Scrape repeatedly until interrupted
    Watch {
        /// Seconds between the start of one pass and the next
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,
    },

    /// Compact the history file in place
    Compact,

    /// Print the normalized value of a price string
    Parse {
        /// Raw price text, e.g. "1.234,56 €"
        text: String,
    },

    /// Lowest recorded price per site and variant
    Lowest {
        #[arg(long)]
        site: Option<String>,

        #[arg(long)]
        variant: Option<String>,
    },

    /// Most recent observation per site and variant
    Latest,
}

impl GlobalArgs {
    /// Load the settings file and apply command-line overrides
    pub fn resolve_settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = ConfigLoader::load_settings(self.config.as_deref())?;
        if let Some(targets) = &self.targets {
            settings.targets_file = targets.clone();
        }
        if let Some(history) = &self.history {
            settings.history_file = history.clone();
        }
        if let Some(concurrency) = self.concurrency {
            settings.scrape.concurrency = concurrency;
        }
        settings.validate()?;
        Ok(settings)
    }
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands, settings: Settings) -> Result<(), AppError> {
        match command {
            Commands::Parse { text } => {
                Self::execute_parse_command(&text);
                Ok(())
            }
            Commands::Run => Self::execute_run_command(settings).await,
            Commands::Watch { interval_secs } => Self::execute_watch_command(settings, interval_secs).await,
            Commands::Compact => Self::execute_compact_command(settings),
            Commands::Lowest { site, variant } => {
                Self::execute_lowest_command(settings, site.as_deref(), variant.as_deref());
                Ok(())
            }
            Commands::Latest => {
                Self::execute_latest_command(settings);
                Ok(())
            }
        }
    }

    async fn execute_run_command(settings: Settings) -> Result<(), AppError> {
        let service = PriceTrackingService::new(settings);
        let report = service.run_once(local_now()).await?;
        let json = report.to_json()?;
        println!("{}", json);
        Ok(())
    }

    async fn execute_watch_command(settings: Settings, interval_secs: u64) -> Result<(), AppError> {
        let service = PriceTrackingService::new(settings);
        let interval = Duration::from_secs(interval_secs.max(1));
        info!("👀 Watching {} every {}s", service.targets_file().display(), interval.as_secs());

        let rounds = watch_rounds(interval, interrupted(), |round| {
            let service = &service;
            async move {
                let report = service.run_once(local_now()).await?;
                info!("Round {}: {}", round, report.summary());
                Ok::<(), AppError>(())
            }
        })
        .await?;

        info!("🛑 Interrupted after {} rounds", rounds);
        Ok(())
    }

    fn execute_compact_command(settings: Settings) -> Result<(), AppError> {
        let service = PriceTrackingService::new(settings);
        let (before, after) = service.compact_only(local_now())?;
        println!("{} -> {} records", before, after);
        Ok(())
    }

    fn execute_parse_command(text: &str) {
        println!("{}", format_price(parse_price(text)));
    }

    fn execute_lowest_command(settings: Settings, site: Option<&str>, variant: Option<&str>) {
        let service = PriceTrackingService::new(settings);
        let lowest = service.lowest(site, variant);
        if lowest.is_empty() {
            println!("No priced observations recorded");
            return;
        }
        for entry in lowest {
            println!(
                "{:<20} {:<12} {:>10.2}  {}  {}",
                entry.site,
                entry.variant,
                entry.price,
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.url
            );
        }
    }

    fn execute_latest_command(settings: Settings) {
        let service = PriceTrackingService::new(settings);
        for record in service.latest() {
            println!(
                "{:<20} {:<12} {:>10}  {}",
                record.site,
                record.variant,
                format_price(record.price),
                record.timestamp.format("%Y-%m-%d %H:%M")
            );
        }
    }
}

/// Resolves on Ctrl-C; never resolves when the handler cannot be installed
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl-C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Run `round` on every tick until `shutdown` resolves; returns the rounds started.
///
/// `shutdown` is polled for the whole watch, including while a round is in
/// flight, and interrupts that round. A target list error ends the watch;
/// other round errors are logged and the next tick proceeds.
pub(crate) async fn watch_rounds<S, F, Fut>(
    interval: Duration,
    shutdown: S,
    mut round: F,
) -> Result<u64, AppError>
where
    S: Future<Output = ()>,
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<(), AppError>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);
    let mut started = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => return Ok(started),
        }

        started += 1;
        info!("🔄 Round {}", started);
        tokio::select! {
            result = round(started) => match result {
                Ok(()) => {}
                Err(AppError::ConfigError(e)) => {
                    error!("❌ Cannot read targets: {}", e);
                    return Err(AppError::ConfigError(e));
                }
                Err(e) => warn!("⚠️  Round {} failed: {}", started, e),
            },
            _ = &mut shutdown => {
                warn!("Round {} interrupted", started);
                return Ok(started);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_global_overrides() {
        let cli = Cli::try_parse_from([
            "pricewatch",
            "lowest",
            "--site",
            "Amazon ES",
            "--concurrency",
            "3",
            "--history",
            "/tmp/h.json",
        ])
        .unwrap();

        assert_eq!(cli.global.concurrency, Some(3));
        assert_eq!(cli.global.history, Some(PathBuf::from("/tmp/h.json")));
        assert!(matches!(
            cli.command,
            Commands::Lowest { site: Some(ref s), variant: None } if s == "Amazon ES"
        ));
    }

    #[test]
    fn test_watch_interval_default() {
        let cli = Cli::try_parse_from(["pricewatch", "watch"]).unwrap();
        assert!(matches!(cli.command, Commands::Watch { interval_secs: 3600 }));
    }

    #[test]
    fn test_overrides_applied_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("pricewatch.toml");
        std::fs::write(&config, "[scrape]\nconcurrency = 8\n").unwrap();

        let args = GlobalArgs {
            config: Some(config),
            targets: Some(PathBuf::from("targets.json")),
            concurrency: Some(2),
            ..GlobalArgs::default()
        };
        let settings = args.resolve_settings().unwrap();
        assert_eq!(settings.scrape.concurrency, 2);
        assert_eq!(settings.targets_file, PathBuf::from("targets.json"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("pricewatch.toml");
        std::fs::write(&config, "").unwrap();

        let args = GlobalArgs {
            config: Some(config),
            concurrency: Some(0),
            ..GlobalArgs::default()
        };
        assert!(matches!(args.resolve_settings(), Err(ConfigError::Invalid(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_stops_mid_round() {
        let started = tokio::time::Instant::now();
        let shutdown = tokio::time::sleep(Duration::from_secs(5));

        let rounds = watch_rounds(Duration::from_secs(60), shutdown, |_| async {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok::<(), AppError>(())
        })
        .await
        .unwrap();

        assert_eq!(rounds, 1);
        assert!(started.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_keeps_going_after_round_errors() {
        let shutdown = tokio::time::sleep(Duration::from_secs(25));

        let rounds = watch_rounds(Duration::from_secs(10), shutdown, |_| async {
            Err::<(), AppError>(AppError::BrowserError("launch failed".into()))
        })
        .await
        .unwrap();

        // ticks at 0s, 10s and 20s
        assert_eq!(rounds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_stops_on_target_list_error() {
        let result = watch_rounds(Duration::from_secs(10), std::future::pending(), |_| async {
            Err::<(), AppError>(AppError::ConfigError("config.json missing".into()))
        })
        .await;

        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
