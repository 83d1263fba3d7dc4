// Engine operations: series, episodes and seasons

use crate::error::{Result, VideothequeError};
use crate::library::{seasons, series};
use crate::models::{MediaInput, Season, SeriesEpisode, SeriesInput, SeriesMetadata, SeriesUpdate, SeriesView};
use super::media::EPISODE_WRITE;
use super::{Collection, Engine};

impl Engine {
    pub fn add_series(&mut self, input: SeriesInput) -> Result<SeriesMetadata> {
        let created = series::add_series(&mut self.data, input)?;
        self.persist_now(&[Collection::SeriesMetadata, Collection::SeriesSeasons])?;
        Ok(created)
    }

    pub fn update_series(&mut self, series_id: &str, update: SeriesUpdate) -> Result<SeriesMetadata> {
        let renamed = update.name.is_some();
        let updated = series::update_series(&mut self.data, series_id, update)?;

        if renamed {
            self.persist_now(&[Collection::SeriesEpisodes, Collection::SeriesMetadata])?;
        } else {
            self.persist_now(&[Collection::SeriesMetadata])?;
        }
        Ok(updated)
    }

    /// Refused while any episode still references the series.
    pub fn delete_series(&mut self, series_id: &str) -> Result<SeriesMetadata> {
        let removed = series::delete_series(&mut self.data, series_id)?;
        self.persist_later(&[Collection::SeriesMetadata, Collection::SeriesSeasons]);
        Ok(removed)
    }

    /// Append an episode. Episodes, metadata and config are written before
    /// returning; the recomputed seasons go through the coalescer.
    pub fn add_episode_to_series(&mut self, input: MediaInput) -> Result<SeriesEpisode> {
        let episode = series::add_episode(&mut self.data, input)?;

        self.persist_now(&EPISODE_WRITE)?;
        self.persist_later(&[Collection::SeriesSeasons]);

        log::info!(
            "Added episode '{}' to series {}",
            episode.media.title,
            episode.series_id
        );
        Ok(episode)
    }

    pub fn get_series_by_id(&self, series_id: &str) -> Result<SeriesView> {
        series::series_view(&self.data, series_id)
    }

    pub fn list_series(&self) -> Vec<SeriesMetadata> {
        series::list_series(&self.data)
    }

    /// Rebuild the Unassigned season of a series from its episodes.
    pub fn recompute_default_season(&mut self, series_id: &str) -> Result<Vec<Season>> {
        if self.data.series(series_id).is_none() {
            return Err(VideothequeError::SeriesNotFound(series_id.to_string()));
        }

        seasons::recompute_default_season(&mut self.data, series_id);
        self.persist_later(&[Collection::SeriesSeasons]);
        seasons::get_series_seasons(&self.data, series_id)
    }

    /// Replace the season list of a series. Rejected lists leave it untouched.
    pub fn save_series_seasons(&mut self, series_id: &str, list: Vec<Season>) -> Result<Vec<Season>> {
        let saved = seasons::save_series_seasons(&mut self.data, series_id, list)?;
        self.persist_later(&[Collection::SeriesSeasons]);
        Ok(saved)
    }

    pub fn save_season(&mut self, series_id: &str, season: Season) -> Result<Season> {
        let saved = seasons::save_season(&mut self.data, series_id, season)?;
        self.persist_later(&[Collection::SeriesSeasons]);
        Ok(saved)
    }

    pub fn delete_season(&mut self, series_id: &str, season_id: &str) -> Result<Season> {
        let removed = seasons::delete_season(&mut self.data, series_id, season_id)?;
        self.persist_later(&[Collection::SeriesSeasons]);
        Ok(removed)
    }

    pub fn get_series_seasons(&self, series_id: &str) -> Result<Vec<Season>> {
        seasons::get_series_seasons(&self.data, series_id)
    }

    /// Repair pass for series records stored without an id. Not run on open.
    pub fn cleanup_corrupted_series(&mut self) -> Result<usize> {
        let removed = series::cleanup_corrupted(&mut self.data);
        if removed > 0 {
            self.persist_now(&[Collection::SeriesMetadata])?;
        }
        Ok(removed)
    }
}
