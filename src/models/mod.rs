// Document types persisted by the store

pub mod config;
pub mod season;
pub mod series;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::VideothequeError;

pub use config::{AppConfig, PredefinedTags, Settings, TagCatalog};
pub use season::{EpisodeRange, EpisodeRef, Season, SeasonKind};
pub use series::{SeasonGroup, SeriesInput, SeriesMetadata, SeriesUpdate, SeriesView};

/// Typed tag arrays carried by every media record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagBuckets {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default)]
    pub mood: Vec<String>,
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub personal_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub franchise: Option<String>,
}

/// The tag arrays that feed `tagStats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TagBucket {
    Genres,
    Mood,
    Technical,
    #[default]
    PersonalTags,
}

impl TagBucket {
    pub const ALL: [TagBucket; 4] = [
        TagBucket::Genres,
        TagBucket::Mood,
        TagBucket::Technical,
        TagBucket::PersonalTags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagBucket::Genres => "genres",
            TagBucket::Mood => "mood",
            TagBucket::Technical => "technical",
            TagBucket::PersonalTags => "personalTags",
        }
    }
}

impl FromStr for TagBucket {
    type Err = VideothequeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genres" => Ok(TagBucket::Genres),
            "mood" => Ok(TagBucket::Mood),
            "technical" => Ok(TagBucket::Technical),
            "personalTags" | "personal_tags" | "personal" => Ok(TagBucket::PersonalTags),
            other => Err(VideothequeError::InvalidInput(format!("Unknown tag bucket: {}", other))),
        }
    }
}

impl TagBuckets {
    pub fn bucket(&self, bucket: TagBucket) -> &Vec<String> {
        match bucket {
            TagBucket::Genres => &self.genres,
            TagBucket::Mood => &self.mood,
            TagBucket::Technical => &self.technical,
            TagBucket::PersonalTags => &self.personal_tags,
        }
    }

    pub fn bucket_mut(&mut self, bucket: TagBucket) -> &mut Vec<String> {
        match bucket {
            TagBucket::Genres => &mut self.genres,
            TagBucket::Mood => &mut self.mood,
            TagBucket::Technical => &mut self.technical,
            TagBucket::PersonalTags => &mut self.personal_tags,
        }
    }

    /// Every tag in the counted buckets, one entry per occurrence.
    pub fn counted_tags(&self) -> Vec<String> {
        TagBucket::ALL
            .iter()
            .flat_map(|b| self.bucket(*b).iter().cloned())
            .collect()
    }

    /// Remove `tag` from every counted bucket. Returns how many entries were removed.
    pub fn strip(&mut self, tag: &str) -> usize {
        let mut removed = 0;
        for bucket in TagBucket::ALL {
            let list = self.bucket_mut(bucket);
            let before = list.len();
            list.retain(|t| t != tag);
            removed += before - list.len();
        }
        removed
    }
}

/// A standalone video entry (not part of a series).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(default)]
    pub id: String,
    pub path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Thumbnail file name inside `thumbnails/`, never a full path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    // Derived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_category: Option<String>,

    #[serde(flatten)]
    pub tags: TagBuckets,

    #[serde(default = "Utc::now")]
    pub date_added: DateTime<Utc>,
    #[serde(default)]
    pub rating: f64,

    /// Fields written by other tools; kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A media entry owned by a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesEpisode {
    #[serde(flatten)]
    pub media: MediaItem,
    #[serde(default)]
    pub series_id: String,
    #[serde(default)]
    pub series_name: String,
    #[serde(rename = "season_number", default, skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    #[serde(rename = "episode_number", default, skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
}

/// What a scanner or the UI hands over when adding a media.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInput {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    #[serde(rename = "season_number", default, skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    #[serde(rename = "episode_number", default, skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    #[serde(flatten)]
    pub tags: TagBuckets,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaInput {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// True when this input belongs in the episode collection.
    pub fn is_episode(&self) -> bool {
        self.category.as_deref() == Some(crate::constants::SERIES_CATEGORY)
            && self.series_id.as_deref().map_or(false, |id| !id.is_empty())
    }
}

/// Either kind of media record, as returned by cross-collection queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MediaRecord {
    Unique(MediaItem),
    Episode(SeriesEpisode),
}

impl MediaRecord {
    pub fn media(&self) -> &MediaItem {
        match self {
            MediaRecord::Unique(item) => item,
            MediaRecord::Episode(episode) => &episode.media,
        }
    }

    pub fn id(&self) -> &str {
        &self.media().id
    }

    pub fn is_episode(&self) -> bool {
        matches!(self, MediaRecord::Episode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_episode_json_keeps_snake_case_numbers() {
        let raw = json!({
            "id": "episode_1",
            "path": "/tv/foo/s01e02.mkv",
            "title": "Pilot",
            "seriesId": "series_1",
            "seriesName": "Foo",
            "season_number": 1,
            "episode_number": 2,
            "genres": ["drama"],
            "dateAdded": "2024-01-01T00:00:00Z",
            "rating": 0
        });

        let episode: SeriesEpisode = serde_json::from_value(raw).unwrap();
        assert_eq!(episode.series_id, "series_1");
        assert_eq!(episode.episode_number, Some(2));
        assert_eq!(episode.media.tags.genres, vec!["drama"]);
        assert!(episode.media.extra.is_empty(), "Known keys must not leak into extra");

        let back = serde_json::to_value(&episode).unwrap();
        assert_eq!(back["season_number"], 1);
        assert_eq!(back["seriesId"], "series_1");
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let raw = json!({
            "id": "media_1",
            "path": "/movies/a.mkv",
            "title": "A",
            "resolution": "1920x1080",
            "dateAdded": "2024-01-01T00:00:00Z"
        });

        let item: MediaItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.extra.get("resolution"), Some(&json!("1920x1080")));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["resolution"], "1920x1080");
    }

    #[test]
    fn test_strip_counts_removed_entries() {
        let mut tags = TagBuckets {
            genres: vec!["noir".into(), "drama".into()],
            personal_tags: vec!["noir".into()],
            ..Default::default()
        };
        assert_eq!(tags.strip("noir"), 2);
        assert_eq!(tags.counted_tags(), vec!["drama".to_string()]);
    }

    #[test]
    fn test_bucket_parsing() {
        assert_eq!("personalTags".parse::<TagBucket>().unwrap(), TagBucket::PersonalTags);
        assert_eq!("mood".parse::<TagBucket>().unwrap(), TagBucket::Mood);
        assert!("colour".parse::<TagBucket>().is_err());
    }
}
