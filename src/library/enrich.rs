// Derived media fields (decade, duration labels) and input clean-up

use std::path::Path;

use crate::constants::{
    DURATION_LONG, DURATION_MEDIUM, DURATION_SHORT, MEDIUM_DURATION_SECS, SHORT_DURATION_SECS,
    VIDEO_EXTENSIONS,
};
use crate::models::{MediaItem, TagBucket};
use super::tags::normalize_tags;

/// "1994" -> "1990s"
pub fn decade_for(year: i32) -> String {
    format!("{}s", year.div_euclid(10) * 10)
}

/// Human readable duration: "1h 05m", "42m", "30s".
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;

    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", total)
    }
}

pub fn duration_category(seconds: f64) -> &'static str {
    if seconds < SHORT_DURATION_SECS {
        DURATION_SHORT
    } else if seconds < MEDIUM_DURATION_SECS {
        DURATION_MEDIUM
    } else {
        DURATION_LONG
    }
}

/// Keep only the file name of a thumbnail reference.
pub fn thumbnail_file_name(reference: &str) -> Option<String> {
    Path::new(reference)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
}

/// Lower-cased file extension when it is a known video container.
pub fn format_from_path(path: &str) -> Option<String> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

fn title_from_path(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Fill in derived fields and normalize the counted tag buckets.
pub fn enrich(item: &mut MediaItem) {
    if item.title.trim().is_empty() {
        item.title = title_from_path(&item.path);
    }

    if item.format.is_none() {
        item.format = format_from_path(&item.path);
    }

    item.thumbnail = item.thumbnail.as_deref().and_then(thumbnail_file_name);

    item.decade = item.year.map(decade_for);
    item.duration_formatted = item.duration.map(format_duration);
    item.duration_category = item.duration.map(|d| duration_category(d).to_string());

    for bucket in TagBucket::ALL {
        let normalized = normalize_tags(item.tags.bucket(bucket));
        *item.tags.bucket_mut(bucket) = normalized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decade() {
        assert_eq!(decade_for(1994), "1990s");
        assert_eq!(decade_for(2000), "2000s");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3900.0), "1h 05m");
        assert_eq!(format_duration(2520.0), "42m");
        assert_eq!(format_duration(30.0), "30s");
    }

    #[test]
    fn test_duration_category_boundaries() {
        assert_eq!(duration_category(29.0 * 60.0), "short");
        assert_eq!(duration_category(30.0 * 60.0), "medium");
        assert_eq!(duration_category(90.0 * 60.0), "long");
    }

    #[test]
    fn test_thumbnail_reference_is_reduced_to_file_name() {
        assert_eq!(
            thumbnail_file_name("/data/thumbnails/thumb_1700000000.jpg").as_deref(),
            Some("thumb_1700000000.jpg")
        );
        assert_eq!(thumbnail_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(thumbnail_file_name(""), None);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(format_from_path("/a/B.MKV").as_deref(), Some("mkv"));
        assert_eq!(format_from_path("/a/notes.txt"), None);
    }
}
