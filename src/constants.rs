// Videotheque Constants
// File names and folder names are part of the on-disk contract. Do not rename.

pub const CONFIG_VERSION: &str = "1.0.0";

// Paths
pub const APP_DATA_DIR: &str = ".videotheque";
pub const DATABASE_FOLDER: &str = "database";
pub const THUMBNAILS_FOLDER: &str = "thumbnails";

// Collection documents
pub const UNIQUE_MEDIAS_FILE: &str = "medias_uniques.json";
pub const SERIES_EPISODES_FILE: &str = "series_episodes.json";
pub const SERIES_METADATA_FILE: &str = "series_metadata.json";
pub const SERIES_SEASONS_FILE: &str = "series_seasons.json";
pub const APP_CONFIG_FILE: &str = "app_config.json";

// Atomic write suffixes
pub const TEMP_SUFFIX: &str = ".tmp";
pub const BACKUP_SUFFIX: &str = ".backup";

// Write coalescing
pub const DEFAULT_SAVE_DELAY_MS: u64 = 500;

// Ids
pub const MEDIA_ID_PREFIX: &str = "media_";
pub const EPISODE_ID_PREFIX: &str = "episode_";
pub const SERIES_ID_PREFIX: &str = "series_";
pub const SEASON_ID_PREFIX: &str = "season_";
pub const ID_RANDOM_BYTES: usize = 8;

// Seasons
pub const DEFAULT_SEASON_ID: &str = "season-0";
pub const DEFAULT_SEASON_ORDER: u32 = 0;
pub const DEFAULT_SEASON_NAME: &str = "Unassigned";
pub const DEFAULT_EPISODE_SEASON: u32 = 1;

// Categories
pub const SERIES_CATEGORY: &str = "series";
pub const UNCATEGORIZED: &str = "uncategorized";

// Duration buckets (seconds)
pub const SHORT_DURATION_SECS: f64 = 30.0 * 60.0;
pub const MEDIUM_DURATION_SECS: f64 = 90.0 * 60.0;
pub const DURATION_SHORT: &str = "short";
pub const DURATION_MEDIUM: &str = "medium";
pub const DURATION_LONG: &str = "long";

// Tag suggestions
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

// Predefined tag groups. Fixed at build time; user additions go to customTags.
pub const PREDEFINED_GENRES: [&str; 16] = [
    "action", "adventure", "animation", "comedy", "crime", "documentary",
    "drama", "family", "fantasy", "history", "horror", "music", "mystery",
    "romance", "sci-fi", "thriller",
];

pub const PREDEFINED_MOODS: [&str; 10] = [
    "uplifting", "dark", "funny", "tense", "relaxing", "romantic",
    "nostalgic", "thought-provoking", "emotional", "epic",
];

pub const PREDEFINED_TECHNICAL: [&str; 10] = [
    "4k", "1080p", "720p", "sd", "hdr", "dolby-vision", "atmos",
    "subtitled", "dubbed", "black-and-white",
];

// Video extensions accepted as `format` values when it is derived from the path
pub const VIDEO_EXTENSIONS: [&str; 14] = [
    "mp4", "mov", "avi", "mkv", "mpg", "mpeg", "wmv", "flv", "webm",
    "3gp", "m4v", "ts", "vob", "ogv",
];
