// Series repository: series metadata, episodes and the grouped read model

use chrono::Utc;

use crate::constants::{DEFAULT_EPISODE_SEASON, SERIES_ID_PREFIX};
use crate::error::{Result, VideothequeError};
use crate::ids::generate_id;
use crate::models::{
    MediaInput, SeasonGroup, SeriesEpisode, SeriesInput, SeriesMetadata, SeriesUpdate, SeriesView,
};
use super::media::build_episode;
use super::tags::{normalize_tags, record_usage};
use super::{seasons, LibraryData};

fn name_taken(data: &LibraryData, name: &str, except_id: Option<&str>) -> bool {
    let wanted = name.to_lowercase();
    data.series_metadata
        .iter()
        .filter(|s| Some(s.id.as_str()) != except_id)
        .any(|s| s.name.trim().to_lowercase() == wanted)
}

fn clean_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(VideothequeError::InvalidInput("series name is required".to_string()));
    }
    Ok(name.to_string())
}

pub fn add_series(data: &mut LibraryData, input: SeriesInput) -> Result<SeriesMetadata> {
    let name = clean_name(&input.name)?;
    if name_taken(data, &name, None) {
        return Err(VideothequeError::DuplicateSeriesName(name));
    }

    let series = SeriesMetadata {
        id: generate_id(SERIES_ID_PREFIX),
        name,
        description: input.description,
        genres: normalize_tags(&input.genres),
        cast: input.cast,
        creator: input.creator,
        poster: input.poster,
        personal_tags: Vec::new(),
        episode_count: 0,
        date_added: Utc::now(),
        extra: Default::default(),
    };

    data.series_metadata.push(series.clone());
    seasons::recompute_default_season(data, &series.id);

    log::info!("Added series '{}' ({})", series.name, series.id);
    Ok(series)
}

/// Apply a partial update. A rename is copied into every episode's `seriesName`.
pub fn update_series(data: &mut LibraryData, series_id: &str, update: SeriesUpdate) -> Result<SeriesMetadata> {
    if data.series(series_id).is_none() {
        return Err(VideothequeError::SeriesNotFound(series_id.to_string()));
    }

    let new_name = match update.name.as_deref() {
        Some(name) => {
            let name = clean_name(name)?;
            if name_taken(data, &name, Some(series_id)) {
                return Err(VideothequeError::DuplicateSeriesName(name));
            }
            Some(name)
        }
        None => None,
    };

    let series = data
        .series_metadata
        .iter_mut()
        .find(|s| s.id == series_id)
        .ok_or_else(|| VideothequeError::SeriesNotFound(series_id.to_string()))?;

    if let Some(name) = &new_name {
        series.name = name.clone();
    }
    if let Some(description) = update.description {
        series.description = Some(description);
    }
    if let Some(genres) = update.genres {
        series.genres = normalize_tags(&genres);
    }
    if let Some(cast) = update.cast {
        series.cast = cast;
    }
    if let Some(creator) = update.creator {
        series.creator = Some(creator);
    }
    if let Some(poster) = update.poster {
        series.poster = Some(poster);
    }
    let updated = series.clone();

    if let Some(name) = new_name {
        for episode in data.series_episodes.iter_mut().filter(|e| e.series_id == series_id) {
            episode.series_name = name.clone();
        }
    }

    Ok(updated)
}

/// Delete a series that no episode references anymore, along with its seasons.
pub fn delete_series(data: &mut LibraryData, series_id: &str) -> Result<SeriesMetadata> {
    let index = data
        .series_metadata
        .iter()
        .position(|s| s.id == series_id)
        .ok_or_else(|| VideothequeError::SeriesNotFound(series_id.to_string()))?;

    let count = data.series_episodes.iter().filter(|e| e.series_id == series_id).count();
    if count > 0 {
        return Err(VideothequeError::SeriesHasEpisodes {
            id: series_id.to_string(),
            count,
        });
    }

    data.series_seasons.remove(series_id);
    let removed = data.series_metadata.remove(index);

    log::info!("Deleted series '{}' ({})", removed.name, removed.id);
    Ok(removed)
}

/// Append an episode to its series and give it to the default season.
pub fn add_episode(data: &mut LibraryData, input: MediaInput) -> Result<SeriesEpisode> {
    let series_id = input
        .series_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| VideothequeError::InvalidInput("seriesId is required".to_string()))?;
    if input.path.trim().is_empty() {
        return Err(VideothequeError::InvalidInput("path is required".to_string()));
    }

    let series = data
        .series(&series_id)
        .ok_or_else(|| VideothequeError::SeriesNotFound(series_id.clone()))?;
    if data.path_exists(&input.path) {
        return Err(VideothequeError::DuplicatePath(input.path));
    }

    let episode = build_episode(input, series);
    for tag in episode.media.tags.counted_tags() {
        record_usage(&mut data.config.tag_manager.tag_stats, &tag);
    }

    data.series_episodes.push(episode.clone());
    data.refresh_episode_count(&series_id);
    data.refresh_counters();
    seasons::recompute_default_season(data, &series_id);

    Ok(episode)
}

/// Series metadata with its episodes grouped by season number.
///
/// Episodes without a season number land in season 1. Within a group,
/// numbered episodes come first in ascending order; the rest keep
/// collection order.
pub fn series_view(data: &LibraryData, series_id: &str) -> Result<SeriesView> {
    let series = data
        .series(series_id)
        .cloned()
        .ok_or_else(|| VideothequeError::SeriesNotFound(series_id.to_string()))?;

    let mut groups: Vec<SeasonGroup> = Vec::new();
    for episode in data.series_episodes.iter().filter(|e| e.series_id == series_id) {
        let number = episode.season_number.unwrap_or(DEFAULT_EPISODE_SEASON);
        match groups.iter_mut().find(|g| g.season_number == number) {
            Some(group) => group.episodes.push(episode.clone()),
            None => groups.push(SeasonGroup {
                season_number: number,
                episodes: vec![episode.clone()],
            }),
        }
    }

    groups.sort_by_key(|g| g.season_number);
    for group in groups.iter_mut() {
        group
            .episodes
            .sort_by_key(|e| (e.episode_number.is_none(), e.episode_number));
    }

    let partition = seasons::get_series_seasons(data, series_id)?;

    Ok(SeriesView {
        series,
        seasons: groups,
        partition,
    })
}

pub fn list_series(data: &LibraryData) -> Vec<SeriesMetadata> {
    let mut series = data.series_metadata.clone();
    series.sort_by_key(|s| s.name.to_lowercase());
    series
}

/// Repair pass: drop series records stored without an id. Returns how many were removed.
pub fn cleanup_corrupted(data: &mut LibraryData) -> usize {
    let before = data.series_metadata.len();
    data.series_metadata.retain(|s| !s.id.trim().is_empty());
    let removed = before - data.series_metadata.len();

    if removed > 0 {
        log::info!("Removed {} corrupted series record(s)", removed);
    } else {
        log::debug!("No corrupted series records found");
    }
    removed
}
