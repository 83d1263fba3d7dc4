// Media repository: standalone media CRUD, search and statistics

use std::collections::BTreeMap;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::constants::{EPISODE_ID_PREFIX, MEDIA_ID_PREFIX};
use crate::error::{Result, VideothequeError};
use crate::ids::generate_id;
use crate::models::{MediaInput, MediaItem, MediaRecord, SeriesEpisode, SeriesMetadata};
use super::enrich::enrich;
use super::tags::{adjust_usage, record_usage, release_usage};
use super::{seasons, LibraryData};

/// Keys a patch may never overwrite.
const PROTECTED_KEYS: [&str; 2] = ["id", "dateAdded"];

/// Episode-only keys ignored when patching a standalone media.
const EPISODE_KEYS: [&str; 4] = ["seriesId", "seriesName", "season_number", "episode_number"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total_medias: usize,
    pub unique_medias: usize,
    pub series_episodes: usize,
    pub series_count: usize,
    /// Bytes
    pub total_size: u64,
    /// Seconds
    pub total_duration: f64,
    pub formats: BTreeMap<String, usize>,
    pub with_thumbnail: usize,
}

/// Build a fully enriched standalone media record from scanner input.
pub fn build_media_item(input: MediaInput, id_prefix: &str) -> MediaItem {
    let mut item = MediaItem {
        id: generate_id(id_prefix),
        path: input.path,
        title: input.title.unwrap_or_default(),
        description: input.description,
        format: input.format,
        duration: input.duration,
        size: input.size,
        thumbnail: input.thumbnail,
        category: input.category,
        year: input.year,
        decade: None,
        duration_formatted: None,
        duration_category: None,
        tags: input.tags,
        date_added: Utc::now(),
        rating: 0.0,
        extra: input.extra,
    };
    enrich(&mut item);
    item
}

/// Build an episode record owned by `series`.
pub fn build_episode(input: MediaInput, series: &SeriesMetadata) -> SeriesEpisode {
    let season_number = input.season_number;
    let episode_number = input.episode_number;

    SeriesEpisode {
        media: build_media_item(input, EPISODE_ID_PREFIX),
        series_id: series.id.clone(),
        series_name: series.name.clone(),
        season_number,
        episode_number,
    }
}

/// Add a standalone media. Episode inputs must go through `series::add_episode`.
pub fn add_media(data: &mut LibraryData, input: MediaInput) -> Result<MediaItem> {
    if input.path.trim().is_empty() {
        return Err(VideothequeError::InvalidInput("path is required".to_string()));
    }
    if data.path_exists(&input.path) {
        return Err(VideothequeError::DuplicatePath(input.path));
    }

    let item = build_media_item(input, MEDIA_ID_PREFIX);
    for tag in item.tags.counted_tags() {
        record_usage(&mut data.config.tag_manager.tag_stats, &tag);
    }

    data.unique_medias.push(item.clone());
    data.refresh_counters();

    Ok(item)
}

/// Overlay `patch` onto the JSON form of `existing`. Null values clear a field.
fn merge_record<T>(existing: &T, patch: &Map<String, Value>, ignored: &[&str]) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(existing)?;

    if let Value::Object(object) = &mut value {
        for (key, new_value) in patch {
            if PROTECTED_KEYS.contains(&key.as_str()) || ignored.contains(&key.as_str()) {
                continue;
            }
            if new_value.is_null() {
                object.remove(key);
            } else {
                object.insert(key.clone(), new_value.clone());
            }
        }
    }

    Ok(serde_json::from_value(value)?)
}

/// Merge `patch` into the media or episode whose path matches `patch.path`.
///
/// `id` and `dateAdded` are preserved. An episode receiving a different
/// `seriesId` moves to that series; both series are re-partitioned.
pub fn update_media(data: &mut LibraryData, patch: &Map<String, Value>) -> Result<MediaRecord> {
    let path = patch
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| VideothequeError::InvalidInput("path is required".to_string()))?
        .to_string();

    if let Some(index) = data.unique_medias.iter().position(|m| m.path == path) {
        let existing = &data.unique_medias[index];
        let mut merged: MediaItem = merge_record(existing, patch, &EPISODE_KEYS)?;
        enrich(&mut merged);

        adjust_usage(
            &mut data.config.tag_manager.tag_stats,
            &existing.tags.counted_tags(),
            &merged.tags.counted_tags(),
        );
        data.unique_medias[index] = merged.clone();
        data.refresh_counters();

        return Ok(MediaRecord::Unique(merged));
    }

    if let Some(index) = data.series_episodes.iter().position(|e| e.media.path == path) {
        let existing = &data.series_episodes[index];
        let old_series = existing.series_id.clone();
        let old_tags = existing.media.tags.counted_tags();

        let mut merged: SeriesEpisode = merge_record(existing, patch, &["seriesName"])?;
        enrich(&mut merged.media);

        let series_changed = patch.contains_key("seriesId");
        if series_changed {
            let series = data
                .series(&merged.series_id)
                .ok_or_else(|| VideothequeError::SeriesNotFound(merged.series_id.clone()))?;
            merged.series_name = series.name.clone();
        }

        adjust_usage(
            &mut data.config.tag_manager.tag_stats,
            &old_tags,
            &merged.media.tags.counted_tags(),
        );
        data.series_episodes[index] = merged.clone();

        if series_changed {
            for series_id in [old_series.as_str(), merged.series_id.as_str()] {
                data.refresh_episode_count(series_id);
                seasons::recompute_default_season(data, series_id);
            }
        }
        data.refresh_counters();

        return Ok(MediaRecord::Episode(merged));
    }

    Err(VideothequeError::MediaNotFound(path))
}

/// Remove a media or episode by id. Returns the removed record.
pub fn remove_media(data: &mut LibraryData, id: &str) -> Result<MediaRecord> {
    let removed = if let Some(index) = data.unique_medias.iter().position(|m| m.id == id) {
        MediaRecord::Unique(data.unique_medias.remove(index))
    } else if let Some(index) = data.series_episodes.iter().position(|e| e.media.id == id) {
        let episode = data.series_episodes.remove(index);
        data.refresh_episode_count(&episode.series_id);
        seasons::recompute_default_season(data, &episode.series_id);
        MediaRecord::Episode(episode)
    } else {
        return Err(VideothequeError::MediaNotFound(id.to_string()));
    };

    for tag in removed.media().tags.counted_tags() {
        release_usage(&mut data.config.tag_manager.tag_stats, &tag);
    }
    data.refresh_counters();

    Ok(removed)
}

/// Case-insensitive substring match on title and description across both collections.
pub fn search_medias(data: &LibraryData, query: &str) -> Vec<MediaRecord> {
    let needle = query.trim().to_lowercase();
    let matches = |media: &MediaItem| {
        media.title.to_lowercase().contains(&needle)
            || media
                .description
                .as_deref()
                .map_or(false, |d| d.to_lowercase().contains(&needle))
    };

    let uniques = data
        .unique_medias
        .iter()
        .filter(|m| matches(m))
        .map(|m| MediaRecord::Unique(m.clone()));
    let episodes = data
        .series_episodes
        .iter()
        .filter(|e| matches(&e.media))
        .map(|e| MediaRecord::Episode(e.clone()));

    uniques.chain(episodes).collect()
}

pub fn stats(data: &LibraryData) -> LibraryStats {
    let mut stats = LibraryStats {
        total_medias: data.total_medias(),
        unique_medias: data.unique_medias.len(),
        series_episodes: data.series_episodes.len(),
        series_count: data.series_metadata.len(),
        ..Default::default()
    };

    for media in data.all_media() {
        stats.total_size += media.size.unwrap_or(0);
        stats.total_duration += media.duration.unwrap_or(0.0);

        let format = media
            .format
            .as_deref()
            .map(|f| f.to_lowercase())
            .unwrap_or_else(|| "unknown".to_string());
        *stats.formats.entry(format).or_insert(0) += 1;

        if media.thumbnail.as_deref().map_or(false, |t| !t.is_empty()) {
            stats.with_thumbnail += 1;
        }
    }

    stats
}

/// Counts of what `clear_all` dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearSummary {
    pub medias_removed: usize,
    pub episodes_removed: usize,
    pub series_removed: usize,
    pub thumbnails_removed: usize,
}

/// Empty both media collections and all series data; reset counters.
/// Custom tags survive; usage stats are reset with the records they counted.
pub fn clear_all(data: &mut LibraryData) -> ClearSummary {
    let summary = ClearSummary {
        medias_removed: data.unique_medias.len(),
        episodes_removed: data.series_episodes.len(),
        series_removed: data.series_metadata.len(),
        thumbnails_removed: 0,
    };

    data.unique_medias.clear();
    data.series_episodes.clear();
    data.series_metadata.clear();
    data.series_seasons.clear();
    data.config.tag_manager.tag_stats.clear();
    data.refresh_counters();

    summary
}
