// Library snapshot and repository logic
//
// Everything under `library` works on the in-memory `LibraryData` only.
// Persistence decisions live in `engine`.

pub mod enrich;
pub mod media;
pub mod seasons;
pub mod series;
pub mod tags;

use std::collections::{BTreeMap, HashSet};

use crate::constants::UNCATEGORIZED;
use crate::models::{
    AppConfig, MediaItem, MediaRecord, PredefinedTags, Season, SeriesEpisode, SeriesMetadata,
};

/// The single in-memory copy of all five documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryData {
    pub unique_medias: Vec<MediaItem>,
    pub series_episodes: Vec<SeriesEpisode>,
    pub series_metadata: Vec<SeriesMetadata>,
    pub series_seasons: BTreeMap<String, Vec<Season>>,
    pub config: AppConfig,
}

impl LibraryData {
    /// True if any media or episode already uses `path`.
    pub fn path_exists(&self, path: &str) -> bool {
        self.unique_medias.iter().any(|m| m.path == path)
            || self.series_episodes.iter().any(|e| e.media.path == path)
    }

    pub fn total_medias(&self) -> usize {
        self.unique_medias.len() + self.series_episodes.len()
    }

    /// Both media collections, uniques first.
    pub fn all_media(&self) -> impl Iterator<Item = &MediaItem> {
        self.unique_medias
            .iter()
            .chain(self.series_episodes.iter().map(|e| &e.media))
    }

    pub fn find_record(&self, id: &str) -> Option<MediaRecord> {
        if let Some(item) = self.unique_medias.iter().find(|m| m.id == id) {
            return Some(MediaRecord::Unique(item.clone()));
        }
        self.series_episodes
            .iter()
            .find(|e| e.media.id == id)
            .map(|e| MediaRecord::Episode(e.clone()))
    }

    pub fn series(&self, series_id: &str) -> Option<&SeriesMetadata> {
        self.series_metadata.iter().find(|s| s.id == series_id)
    }

    /// Ids of a series' episodes in collection order.
    pub fn series_episode_ids(&self, series_id: &str) -> Vec<String> {
        self.series_episodes
            .iter()
            .filter(|e| e.series_id == series_id)
            .map(|e| e.media.id.clone())
            .collect()
    }

    /// Recompute `totalMedias` and the per-category counters.
    pub fn refresh_counters(&mut self) {
        let mut categories = BTreeMap::new();
        for media in self.all_media() {
            let category = media
                .category
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(UNCATEGORIZED)
                .to_string();
            *categories.entry(category).or_insert(0) += 1;
        }

        self.config.categories = categories;
        self.config.settings.total_medias = self.total_medias();
    }

    /// Recompute `episodeCount` for one series.
    pub fn refresh_episode_count(&mut self, series_id: &str) {
        let count = self
            .series_episodes
            .iter()
            .filter(|e| e.series_id == series_id)
            .count();
        if let Some(series) = self.series_metadata.iter_mut().find(|s| s.id == series_id) {
            series.episode_count = count;
        }
    }

    /// Re-derive everything that can be re-derived from the flat collections.
    /// Returns true when something was out of sync.
    pub fn heal(&mut self) -> bool {
        let before = self.clone();

        self.config.tag_manager.predefined_tags = PredefinedTags::default();
        self.config.tag_manager.tag_stats.retain(|_, count| *count > 0);

        let series_ids: Vec<String> = self
            .series_metadata
            .iter()
            .filter(|s| !s.id.is_empty())
            .map(|s| s.id.clone())
            .collect();

        let known: HashSet<&String> = series_ids.iter().collect();
        self.series_seasons.retain(|id, _| known.contains(id));

        for series_id in &series_ids {
            self.refresh_episode_count(series_id);
            seasons::recompute_default_season(self, series_id);
        }

        self.refresh_counters();

        *self != before
    }
}
