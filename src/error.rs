// Videotheque Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideothequeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Media not found: {0}")]
    MediaNotFound(String),

    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    #[error("Season not found: {0}")]
    SeasonNotFound(String),

    #[error("A media with this path already exists: {0}")]
    DuplicatePath(String),

    #[error("A series with this name already exists: {0}")]
    DuplicateSeriesName(String),

    #[error("Season order {0} is already used by another season")]
    SeasonOrderConflict(u32),

    #[error("The Unassigned season is reserved: {0}")]
    ReservedSeason(String),

    #[error("Series {id} still has {count} episode(s)")]
    SeriesHasEpisodes { id: String, count: usize },

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    #[error("Custom tag not found: {0}")]
    TagNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for VideothequeError {
    fn from(err: anyhow::Error) -> Self {
        VideothequeError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VideothequeError>;
