// Videotheque - embedded persistence layer for a personal media library

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod ids;
pub mod library;
pub mod models;
pub mod response;
pub mod storage;

pub use config::EngineConfig;
pub use engine::{Collection, Engine, ImportSummary};
pub use error::{Result, VideothequeError};
pub use library::media::{ClearSummary, LibraryStats};
pub use library::tags::{TagOperator, TagSuggestion};
pub use response::OpResponse;
