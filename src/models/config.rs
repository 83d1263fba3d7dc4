// App configuration document (app_config.json)

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_VERSION, PREDEFINED_GENRES, PREDEFINED_MOODS, PREDEFINED_TECHNICAL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub last_scan: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_medias: usize,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            last_scan: None,
            total_medias: 0,
        }
    }
}

/// Built-in tag groups. Always rebuilt from constants on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredefinedTags {
    pub genres: Vec<String>,
    pub mood: Vec<String>,
    pub technical: Vec<String>,
}

impl Default for PredefinedTags {
    fn default() -> Self {
        let owned = |tags: &[&str]| tags.iter().map(|t| t.to_string()).collect();
        Self {
            genres: owned(&PREDEFINED_GENRES),
            mood: owned(&PREDEFINED_MOODS),
            technical: owned(&PREDEFINED_TECHNICAL),
        }
    }
}

impl PredefinedTags {
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.genres.iter().chain(self.mood.iter()).chain(self.technical.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCatalog {
    #[serde(default)]
    pub predefined_tags: PredefinedTags,
    #[serde(default)]
    pub custom_tags: BTreeSet<String>,
    /// Usage count per tag. Entries are removed when they reach zero.
    #[serde(default)]
    pub tag_stats: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    /// Media count per category, over both media collections
    #[serde(default)]
    pub categories: BTreeMap<String, usize>,
    #[serde(default)]
    pub tag_manager: TagCatalog,
}
