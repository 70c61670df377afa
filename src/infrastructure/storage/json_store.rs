//! JSON file store for the observation history

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::domain::history::PriceHistory;
use crate::shared::errors::HistoryError;
use crate::shared::utils::local_now;

/// Pretty-printed JSON array of observations, replaced atomically on save
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict load: a missing file is an empty history, anything unreadable is an error
    pub fn try_load(&self) -> Result<PriceHistory, HistoryError> {
        if !self.path.exists() {
            return Ok(PriceHistory::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(PriceHistory::default());
        }
        let history: PriceHistory =
            serde_json::from_str(&content).map_err(|e| HistoryError::Corrupt(e.to_string()))?;
        // re-sort in case the file was edited by hand
        Ok(PriceHistory::new(history.into_records()))
    }

    /// Load, falling back to an empty history on unreadable or corrupt state.
    ///
    /// A corrupt file is copied aside first so the next save does not erase it.
    pub fn load(&self) -> PriceHistory {
        match self.try_load() {
            Ok(history) => {
                info!("Loaded {} history records from {}", history.len(), self.path.display());
                history
            }
            Err(err) => {
                warn!(
                    "⚠️  {} could not be loaded ({}), starting from an empty history",
                    self.path.display(),
                    err
                );
                if matches!(err, HistoryError::Corrupt(_)) {
                    self.backup_corrupt();
                }
                PriceHistory::default()
            }
        }
    }

    fn backup_corrupt(&self) {
        let stamp = local_now().format("%Y%m%dT%H%M%S");
        let mut backup = self.path.clone().into_os_string();
        backup.push(format!(".corrupt-{stamp}"));
        match fs::copy(&self.path, &backup) {
            Ok(_) => warn!("Corrupt history kept at {}", PathBuf::from(&backup).display()),
            Err(e) => warn!("Could not back up corrupt history: {e}"),
        }
    }

    /// Write to a temp file next to the target, then rename over it
    pub fn save(&self, history: &PriceHistory) -> Result<(), HistoryError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, history)?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| HistoryError::Io(e.error))?;

        info!("💾 Saved {} history records to {}", history.len(), self.path.display());
        Ok(())
    }
}
