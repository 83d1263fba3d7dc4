// Engine - owns the library snapshot and decides how each change is persisted
//
// Every operation mutates `LibraryData` through the `library` layer, then
// writes the touched documents either immediately (adds, updates, imports,
// clear) or through the write coalescer (deletes, seasons, tags, config).
// Documents are always written in the order episodes, metadata, seasons,
// config so a crash mid-way leaves counters that the next `open` re-derives.

pub mod media;
pub mod series;
pub mod tags;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::config::EngineConfig;
use crate::constants::{
    APP_CONFIG_FILE, SERIES_EPISODES_FILE, SERIES_METADATA_FILE, SERIES_SEASONS_FILE,
    UNIQUE_MEDIAS_FILE,
};
use crate::error::Result;
use crate::library::enrich::thumbnail_file_name;
use crate::library::LibraryData;
use crate::models::AppConfig;
use crate::storage::fs::{FileSystem, StdFileSystem};
use crate::storage::{JsonStore, SaveHandle, WriteCoalescer};

pub use self::media::ImportSummary;

/// One persisted document under `database/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    UniqueMedias,
    SeriesEpisodes,
    SeriesMetadata,
    SeriesSeasons,
    AppConfig,
}

impl Collection {
    /// Write order for multi-document changes.
    pub const ALL: [Collection; 5] = [
        Collection::UniqueMedias,
        Collection::SeriesEpisodes,
        Collection::SeriesMetadata,
        Collection::SeriesSeasons,
        Collection::AppConfig,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::UniqueMedias => UNIQUE_MEDIAS_FILE,
            Collection::SeriesEpisodes => SERIES_EPISODES_FILE,
            Collection::SeriesMetadata => SERIES_METADATA_FILE,
            Collection::SeriesSeasons => SERIES_SEASONS_FILE,
            Collection::AppConfig => APP_CONFIG_FILE,
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    store: JsonStore,
    coalescer: WriteCoalescer,
    data: LibraryData,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("data_dir", &self.config.data_dir)
            .field("total_medias", &self.data.total_medias())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Open the library at `config.data_dir` on the real filesystem.
    pub fn open(config: EngineConfig) -> Result<Self> {
        Self::open_with(config, Arc::new(StdFileSystem))
    }

    /// Open with an explicit filesystem. Creates the directory layout, loads
    /// every document (falling back to backups) and re-derives counters and
    /// default seasons.
    pub fn open_with(config: EngineConfig, fs: Arc<dyn FileSystem>) -> Result<Self> {
        fs.create_dir_all(&config.database_dir())?;
        fs.create_dir_all(&config.thumbnails_dir())?;

        let store = JsonStore::new(fs);
        let load_path = |c: Collection| config.document_path(c.file_name());

        let mut data = LibraryData {
            unique_medias: store.load_with_fallback(&load_path(Collection::UniqueMedias), Vec::new()),
            series_episodes: store.load_with_fallback(&load_path(Collection::SeriesEpisodes), Vec::new()),
            series_metadata: store.load_with_fallback(&load_path(Collection::SeriesMetadata), Vec::new()),
            series_seasons: store.load_with_fallback(&load_path(Collection::SeriesSeasons), Default::default()),
            config: store.load_with_fallback(&load_path(Collection::AppConfig), AppConfig::default()),
        };
        let healed = data.heal();

        let coalescer = WriteCoalescer::new(config.save_delay)?;
        let engine = Self {
            config,
            store,
            coalescer,
            data,
        };

        log::info!(
            "Opened library at {}: {} media, {} episodes, {} series",
            engine.config.data_dir.display(),
            engine.data.unique_medias.len(),
            engine.data.series_episodes.len(),
            engine.data.series_metadata.len()
        );
        if healed {
            log::info!("Re-derived out of sync counters or seasons, scheduling rewrite");
            engine.persist_later(&Collection::ALL);
        }

        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-only view of the whole snapshot.
    pub fn data(&self) -> &LibraryData {
        &self.data
    }

    fn serialize(&self, collection: Collection) -> Result<Vec<u8>> {
        let bytes = match collection {
            Collection::UniqueMedias => serde_json::to_vec_pretty(&self.data.unique_medias)?,
            Collection::SeriesEpisodes => serde_json::to_vec_pretty(&self.data.series_episodes)?,
            Collection::SeriesMetadata => serde_json::to_vec_pretty(&self.data.series_metadata)?,
            Collection::SeriesSeasons => serde_json::to_vec_pretty(&self.data.series_seasons)?,
            Collection::AppConfig => serde_json::to_vec_pretty(&self.data.config)?,
        };
        Ok(bytes)
    }

    /// Write the given documents now, in order. Every document is attempted;
    /// the first failure is returned.
    pub(crate) fn persist_now(&self, collections: &[Collection]) -> Result<()> {
        let mut first_error = None;

        for collection in collections {
            let result = self.serialize(*collection).and_then(|bytes| {
                let store = self.store.clone();
                let path = self.config.document_path(collection.file_name());
                self.coalescer.save_immediate(
                    collection.file_name(),
                    Box::new(move || store.save_bytes(&path, &bytes)),
                )
            });
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Schedule one document through the coalescer with its current content.
    pub(crate) fn schedule(&self, collection: Collection) -> Result<SaveHandle> {
        let bytes = self.serialize(collection)?;
        let store = self.store.clone();
        let path = self.config.document_path(collection.file_name());

        Ok(self.coalescer.schedule(
            collection.file_name(),
            Box::new(move || store.save_bytes(&path, &bytes)),
        ))
    }

    /// Schedule several documents without waiting for them.
    pub(crate) fn persist_later(&self, collections: &[Collection]) {
        for collection in collections {
            if let Err(e) = self.schedule(*collection) {
                log::error!("Could not schedule save of {}: {}", collection.file_name(), e);
            }
        }
    }

    /// Coalesced save of `app_config.json`. Wait on the handle for durability.
    pub fn save_config(&self) -> Result<SaveHandle> {
        self.schedule(Collection::AppConfig)
    }

    /// Stamp `settings.lastScan` and save the config.
    pub fn record_scan(&mut self) -> Result<SaveHandle> {
        self.data.config.settings.last_scan = Some(Utc::now());
        self.data.refresh_counters();
        self.save_config()
    }

    /// Run every pending coalesced write now.
    pub fn flush(&self) -> Result<()> {
        self.coalescer.flush()
    }

    /// Flush and shut down the write scheduler.
    pub fn close(self) -> Result<()> {
        let result = self.flush();
        log::info!("Closed library at {}", self.config.data_dir.display());
        result
    }

    /// Best-effort removal of a thumbnail file. Returns true if a file was deleted.
    ///
    /// Only the file name of the stored reference is used, and the resolved path
    /// must sit directly inside the thumbnails folder.
    fn remove_thumbnail(&self, reference: &str) -> bool {
        let Some(file_name) = thumbnail_file_name(reference) else {
            return false;
        };

        let dir = self.config.thumbnails_dir();
        let path = dir.join(&file_name);
        if path.parent() != Some(dir.as_path()) {
            log::warn!("Ignoring thumbnail reference outside {}: {}", dir.display(), reference);
            return false;
        }
        remove_file_logged(&**self.store.fs(), &path)
    }
}

fn remove_file_logged(fs: &dyn FileSystem, path: &Path) -> bool {
    if !fs.exists(path) {
        log::debug!("Thumbnail {} already gone", path.display());
        return false;
    }

    match fs.remove(path) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not remove thumbnail {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests;
