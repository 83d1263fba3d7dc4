// Tag registry: custom tag catalog, per-media buckets and usage statistics

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VideothequeError};
use crate::models::{MediaItem, MediaRecord, SeriesEpisode, TagBucket};
use super::LibraryData;

/// How multiple query tags combine in `search_by_tags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagOperator {
    #[default]
    And,
    Or,
}

impl FromStr for TagOperator {
    type Err = VideothequeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(TagOperator::And),
            "OR" => Ok(TagOperator::Or),
            other => Err(VideothequeError::InvalidInput(format!("Unknown operator: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSuggestion {
    pub tag: String,
    pub count: u64,
    pub custom: bool,
}

/// Trim and lowercase.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Normalize, drop empties and duplicates, keep first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| normalize_tag(t))
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

pub fn record_usage(stats: &mut BTreeMap<String, u64>, tag: &str) {
    *stats.entry(tag.to_string()).or_insert(0) += 1;
}

/// Decrement, removing the entry once it reaches zero.
pub fn release_usage(stats: &mut BTreeMap<String, u64>, tag: &str) {
    if let Some(count) = stats.get_mut(tag) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            stats.remove(tag);
        }
    }
}

/// Apply the difference between two tag lists to the stats.
pub fn adjust_usage(stats: &mut BTreeMap<String, u64>, old: &[String], new: &[String]) {
    for tag in old {
        release_usage(stats, tag);
    }
    for tag in new {
        record_usage(stats, tag);
    }
}

fn find_media_mut<'a>(
    uniques: &'a mut [MediaItem],
    episodes: &'a mut [SeriesEpisode],
    media_id: &str,
) -> Option<&'a mut MediaItem> {
    if let Some(item) = uniques.iter_mut().find(|m| m.id == media_id) {
        return Some(item);
    }
    episodes
        .iter_mut()
        .map(|e| &mut e.media)
        .find(|m| m.id == media_id)
}

/// Register a custom tag. Returns the normalized tag.
pub fn add_custom_tag(data: &mut LibraryData, name: &str) -> Result<String> {
    let tag = normalize_tag(name);
    if tag.is_empty() {
        return Err(VideothequeError::InvalidTag(name.to_string()));
    }

    if data.config.tag_manager.custom_tags.insert(tag.clone()) {
        log::info!("Added custom tag '{}'", tag);
    }
    Ok(tag)
}

/// Remove a custom tag and strip it from every record. Returns how many records were touched.
pub fn remove_custom_tag(data: &mut LibraryData, name: &str) -> Result<usize> {
    let tag = normalize_tag(name);
    if tag.is_empty() {
        return Err(VideothequeError::InvalidTag(name.to_string()));
    }
    if !data.config.tag_manager.custom_tags.contains(&tag) {
        return Err(VideothequeError::TagNotFound(tag));
    }

    let mut touched = 0;
    for media in data.unique_medias.iter_mut() {
        if media.tags.strip(&tag) > 0 {
            touched += 1;
        }
    }
    for episode in data.series_episodes.iter_mut() {
        if episode.media.tags.strip(&tag) > 0 {
            touched += 1;
        }
    }
    for series in data.series_metadata.iter_mut() {
        let before = series.personal_tags.len() + series.genres.len();
        series.personal_tags.retain(|t| normalize_tag(t) != tag);
        series.genres.retain(|t| normalize_tag(t) != tag);
        if series.personal_tags.len() + series.genres.len() != before {
            touched += 1;
        }
    }

    let catalog = &mut data.config.tag_manager;
    catalog.custom_tags.remove(&tag);
    catalog.tag_stats.remove(&tag);

    log::info!("Removed tag '{}' from {} record(s)", tag, touched);
    Ok(touched)
}

/// Append tags to one bucket of a media or episode. Returns the bucket afterwards.
pub fn add_tags_to_media(
    data: &mut LibraryData,
    media_id: &str,
    tags: &[String],
    bucket: TagBucket,
) -> Result<Vec<String>> {
    let media = find_media_mut(&mut data.unique_medias, &mut data.series_episodes, media_id)
        .ok_or_else(|| VideothequeError::MediaNotFound(media_id.to_string()))?;
    let stats = &mut data.config.tag_manager.tag_stats;

    let list = media.tags.bucket_mut(bucket);
    for tag in normalize_tags(tags) {
        if !list.contains(&tag) {
            record_usage(stats, &tag);
            list.push(tag);
        }
    }

    Ok(list.clone())
}

/// Remove tags from one bucket of a media or episode. Returns the bucket afterwards.
pub fn remove_tags_from_media(
    data: &mut LibraryData,
    media_id: &str,
    tags: &[String],
    bucket: TagBucket,
) -> Result<Vec<String>> {
    let media = find_media_mut(&mut data.unique_medias, &mut data.series_episodes, media_id)
        .ok_or_else(|| VideothequeError::MediaNotFound(media_id.to_string()))?;
    let stats = &mut data.config.tag_manager.tag_stats;

    let list = media.tags.bucket_mut(bucket);
    for tag in normalize_tags(tags) {
        if let Some(pos) = list.iter().position(|t| *t == tag) {
            list.remove(pos);
            release_usage(stats, &tag);
        }
    }

    Ok(list.clone())
}

/// Every searchable tag of a media, lowercased.
fn searchable_tags(media: &MediaItem) -> HashSet<String> {
    let tags = &media.tags;
    tags.genres
        .iter()
        .chain(tags.mood.iter())
        .chain(tags.technical.iter())
        .chain(tags.personal_tags.iter())
        .chain(tags.franchise.iter())
        .chain(media.duration_category.iter())
        .chain(media.decade.iter())
        .map(|t| t.to_lowercase())
        .collect()
}

fn matches_tags(media: &MediaItem, query: &[String], operator: TagOperator) -> bool {
    let flattened = searchable_tags(media);
    let hit = |q: &String| flattened.iter().any(|t| t.contains(q.as_str()));

    match operator {
        TagOperator::And => query.iter().all(hit),
        TagOperator::Or => query.iter().any(hit),
    }
}

/// Media whose tags match the query. An empty query matches nothing.
pub fn search_by_tags(data: &LibraryData, tags: &[String], operator: TagOperator) -> Vec<MediaRecord> {
    let query = normalize_tags(tags);
    if query.is_empty() {
        return Vec::new();
    }

    let uniques = data
        .unique_medias
        .iter()
        .filter(|m| matches_tags(m, &query, operator))
        .map(|m| MediaRecord::Unique(m.clone()));
    let episodes = data
        .series_episodes
        .iter()
        .filter(|e| matches_tags(&e.media, &query, operator))
        .map(|e| MediaRecord::Episode(e.clone()));

    uniques.chain(episodes).collect()
}

fn rank(mut suggestions: Vec<TagSuggestion>, limit: usize) -> Vec<TagSuggestion> {
    suggestions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    suggestions.truncate(limit);
    suggestions
}

/// Predefined and custom tags containing `query`, most used first.
pub fn tag_suggestions(data: &LibraryData, query: &str, limit: usize) -> Vec<TagSuggestion> {
    let needle = normalize_tag(query);
    let catalog = &data.config.tag_manager;

    let mut seen = HashSet::new();
    let mut suggestions = Vec::new();

    let predefined = catalog.predefined_tags.all().map(|t| (t, false));
    let custom = catalog.custom_tags.iter().map(|t| (t, true));

    for (tag, is_custom) in predefined.chain(custom) {
        if tag.contains(&needle) && seen.insert(tag.clone()) {
            suggestions.push(TagSuggestion {
                tag: tag.clone(),
                count: catalog.tag_stats.get(tag).copied().unwrap_or(0),
                custom: is_custom,
            });
        }
    }

    rank(suggestions, limit)
}

/// Most used tags overall.
pub fn popular_tags(data: &LibraryData, limit: usize) -> Vec<TagSuggestion> {
    let catalog = &data.config.tag_manager;
    let suggestions = catalog
        .tag_stats
        .iter()
        .map(|(tag, count)| TagSuggestion {
            tag: tag.clone(),
            count: *count,
            custom: catalog.custom_tags.contains(tag),
        })
        .collect();

    rank(suggestions, limit)
}
