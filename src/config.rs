// Engine configuration: data directory layout and save delay

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{APP_DATA_DIR, DATABASE_FOLDER, DEFAULT_SAVE_DELAY_MS, THUMBNAILS_FOLDER};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Root holding `database/` and `thumbnails/`
    pub data_dir: PathBuf,
    /// Debounce window for coalesced writes
    pub save_delay: Duration,
}

/// ~/.videotheque, or ./.videotheque when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    match directories::BaseDirs::new() {
        Some(home) => home.home_dir().join(APP_DATA_DIR),
        None => {
            log::warn!("Could not determine home directory, using ./{}", APP_DATA_DIR);
            PathBuf::from(APP_DATA_DIR)
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(default_data_dir())
    }
}

impl EngineConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            save_delay: Duration::from_millis(DEFAULT_SAVE_DELAY_MS),
        }
    }

    pub fn with_save_delay(mut self, delay: Duration) -> Self {
        self.save_delay = delay;
        self
    }

    pub fn database_dir(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FOLDER)
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.data_dir.join(THUMBNAILS_FOLDER)
    }

    /// Full path of one collection document.
    pub fn document_path(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.database_dir().join(file_name)
    }
}
