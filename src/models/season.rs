// Season documents (series_seasons.json)

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SEASON_ID, DEFAULT_SEASON_NAME, DEFAULT_SEASON_ORDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonKind {
    #[default]
    Standard,
    Custom,
    /// The auto-maintained "Unassigned" season (order 0)
    #[serde(rename = "default")]
    Unassigned,
}

/// 1-based inclusive range of episode positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRange {
    pub from: u32,
    pub to: u32,
}

/// Season membership entry.
///
/// Stored as an episode id. Positional indices written by older versions are
/// accepted on read and resolved to ids on the next partition pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EpisodeRef {
    Index(usize),
    Id(String),
}

impl EpisodeRef {
    pub fn as_id(&self) -> Option<&str> {
        match self {
            EpisodeRef::Id(id) => Some(id),
            EpisodeRef::Index(_) => None,
        }
    }
}

impl From<&str> for EpisodeRef {
    fn from(id: &str) -> Self {
        EpisodeRef::Id(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    #[serde(default)]
    pub id: String,
    pub order: u32,
    #[serde(rename = "type", default)]
    pub kind: SeasonKind,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_range: Option<EpisodeRange>,
    #[serde(default)]
    pub episodes: Vec<EpisodeRef>,
    #[serde(default = "editable_by_default")]
    pub editable: bool,
}

fn editable_by_default() -> bool {
    true
}

impl Season {
    /// The reserved order-0 season.
    pub fn unassigned() -> Self {
        Self {
            id: DEFAULT_SEASON_ID.to_string(),
            order: DEFAULT_SEASON_ORDER,
            kind: SeasonKind::Unassigned,
            name: DEFAULT_SEASON_NAME.to_string(),
            season_number: None,
            episode_range: None,
            episodes: Vec::new(),
            editable: false,
        }
    }

    /// A user season with the given order.
    pub fn standard(order: u32, name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            order,
            kind: SeasonKind::Standard,
            name: name.into(),
            season_number: Some(order),
            episode_range: None,
            episodes: Vec::new(),
            editable: true,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.order == DEFAULT_SEASON_ORDER
    }

    /// Episode ids currently referenced (unresolved indices are skipped).
    pub fn episode_ids(&self) -> Vec<&str> {
        self.episodes.iter().filter_map(|e| e.as_id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_index_membership_parses() {
        let season: Season = serde_json::from_value(json!({
            "id": "season-1",
            "order": 1,
            "type": "standard",
            "name": "Season 1",
            "episodeRange": {"from": 1, "to": 2},
            "episodes": [0, 1]
        }))
        .unwrap();

        assert_eq!(season.episodes, vec![EpisodeRef::Index(0), EpisodeRef::Index(1)]);
        assert!(season.editable);
    }

    #[test]
    fn test_unassigned_serializes_as_default_type() {
        let value = serde_json::to_value(Season::unassigned()).unwrap();
        assert_eq!(value["type"], "default");
        assert_eq!(value["order"], 0);
        assert_eq!(value["editable"], false);
    }
}
