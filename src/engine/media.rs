// Engine operations: media repository

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, VideothequeError};
use crate::library::media::{self, ClearSummary, LibraryStats};
use crate::library::series;
use crate::models::{MediaInput, MediaItem, MediaRecord, SeriesEpisode};
use super::{Collection, Engine};

const UNIQUE_WRITE: [Collection; 2] = [Collection::UniqueMedias, Collection::AppConfig];

pub(super) const EPISODE_WRITE: [Collection; 3] = [
    Collection::SeriesEpisodes,
    Collection::SeriesMetadata,
    Collection::AppConfig,
];

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub added: usize,
    /// Paths already in the library
    pub skipped: usize,
    pub failed: usize,
}

impl Engine {
    /// Add a media; inputs in the series category with a `seriesId` become episodes.
    pub fn add_media(&mut self, input: MediaInput) -> Result<MediaRecord> {
        if input.is_episode() {
            return self.add_episode_to_series(input).map(MediaRecord::Episode);
        }

        let item = media::add_media(&mut self.data, input)?;
        self.persist_now(&UNIQUE_WRITE)?;

        log::info!("Added media '{}' ({})", item.title, item.id);
        Ok(MediaRecord::Unique(item))
    }

    /// Add many medias and persist once. Duplicated paths are skipped.
    pub fn import_medias(&mut self, inputs: Vec<MediaInput>) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut touched_series = Vec::new();

        for input in inputs {
            let path = input.path.clone();
            let result = if input.is_episode() {
                series::add_episode(&mut self.data, input).map(|e| touched_series.push(e.series_id))
            } else {
                media::add_media(&mut self.data, input).map(|_| ())
            };

            match result {
                Ok(()) => summary.added += 1,
                Err(VideothequeError::DuplicatePath(_)) => summary.skipped += 1,
                Err(e) => {
                    log::warn!("Import of {} failed: {}", path, e);
                    summary.failed += 1;
                }
            }
        }

        if summary.added > 0 {
            if touched_series.is_empty() {
                self.persist_now(&UNIQUE_WRITE)?;
            } else {
                self.persist_now(&Collection::ALL)?;
            }
        }

        log::info!(
            "Import finished: {} added, {} skipped, {} failed",
            summary.added,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    /// Merge a partial record into the media or episode with the same `path`.
    pub fn update_media(&mut self, patch: &Map<String, Value>) -> Result<MediaRecord> {
        let record = media::update_media(&mut self.data, patch)?;

        match &record {
            MediaRecord::Unique(_) => self.persist_now(&UNIQUE_WRITE)?,
            MediaRecord::Episode(_) => self.persist_now(&[
                Collection::SeriesEpisodes,
                Collection::SeriesMetadata,
                Collection::SeriesSeasons,
                Collection::AppConfig,
            ])?,
        }

        Ok(record)
    }

    /// Delete a media or episode by id and its thumbnail. Saves are coalesced.
    pub fn delete_media(&mut self, id: &str) -> Result<MediaRecord> {
        let removed = media::remove_media(&mut self.data, id)?;

        if let Some(thumbnail) = removed.media().thumbnail.as_deref() {
            self.remove_thumbnail(thumbnail);
        }

        if removed.is_episode() {
            self.persist_later(&[
                Collection::SeriesEpisodes,
                Collection::SeriesMetadata,
                Collection::SeriesSeasons,
                Collection::AppConfig,
            ]);
        } else {
            self.persist_later(&UNIQUE_WRITE);
        }

        log::info!("Deleted media {}", id);
        Ok(removed)
    }

    pub fn get_media(&self, id: &str) -> Result<MediaRecord> {
        self.data
            .find_record(id)
            .ok_or_else(|| VideothequeError::MediaNotFound(id.to_string()))
    }

    pub fn list_unique_medias(&self) -> &[MediaItem] {
        &self.data.unique_medias
    }

    /// Episodes of one series, or all of them.
    pub fn list_episodes(&self, series_id: Option<&str>) -> Vec<SeriesEpisode> {
        self.data
            .series_episodes
            .iter()
            .filter(|e| series_id.map_or(true, |id| e.series_id == id))
            .cloned()
            .collect()
    }

    pub fn search_medias(&self, query: &str) -> Vec<MediaRecord> {
        media::search_medias(&self.data, query)
    }

    pub fn get_stats(&self) -> LibraryStats {
        media::stats(&self.data)
    }

    /// Remove every media, episode and series, and every thumbnail file.
    pub fn clear_all_medias(&mut self) -> Result<ClearSummary> {
        let mut summary = media::clear_all(&mut self.data);

        let thumbnails_dir = self.config.thumbnails_dir();
        match self.store.fs().list_dir(&thumbnails_dir) {
            Ok(files) => {
                for file in files {
                    if let Some(name) = file.file_name().and_then(|n| n.to_str()) {
                        if self.remove_thumbnail(name) {
                            summary.thumbnails_removed += 1;
                        }
                    }
                }
            }
            Err(e) => log::warn!("Could not list {}: {}", thumbnails_dir.display(), e),
        }

        self.persist_now(&Collection::ALL)?;

        log::info!(
            "Cleared library: {} media, {} episodes, {} series, {} thumbnails",
            summary.medias_removed,
            summary.episodes_removed,
            summary.series_removed,
            summary.thumbnails_removed
        );
        Ok(summary)
    }
}
