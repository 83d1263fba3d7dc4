// Engine tests: persistence policy, reopen and crash behavior

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::error::VideothequeError;
use crate::library::tags::TagOperator;
use crate::models::{
    EpisodeRange, EpisodeRef, MediaInput, MediaRecord, Season, SeasonKind, SeriesInput, TagBucket,
};
use crate::storage::testing::{CountingFs, CrashingFs};

fn config(tmp: &TempDir) -> EngineConfig {
    EngineConfig::new(tmp.path()).with_save_delay(Duration::from_millis(50))
}

fn open(tmp: &TempDir) -> Engine {
    Engine::open(config(tmp)).unwrap()
}

fn read_doc(tmp: &TempDir, file_name: &str) -> serde_json::Value {
    let bytes = std::fs::read(tmp.path().join("database").join(file_name)).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn test_open_creates_layout() {
    let tmp = TempDir::new().unwrap();
    let engine = open(&tmp);

    assert!(tmp.path().join("database").is_dir());
    assert!(tmp.path().join("thumbnails").is_dir());
    assert_eq!(engine.data().total_medias(), 0);
    assert_eq!(engine.get_tag_catalog().predefined_tags.genres.len(), 16);
}

#[test]
fn test_add_media_is_durable_immediately() {
    let tmp = TempDir::new().unwrap();
    let mut engine = open(&tmp);

    engine.add_media(MediaInput::new("/movies/a.mkv")).unwrap();

    let doc = read_doc(&tmp, "medias_uniques.json");
    assert_eq!(doc.as_array().unwrap().len(), 1);
    assert_eq!(read_doc(&tmp, "app_config.json")["settings"]["totalMedias"], 1);
}

#[test]
fn test_round_trip_after_reopen() {
    let tmp = TempDir::new().unwrap();
    let added = {
        let mut engine = open(&tmp);
        let input = MediaInput {
            title: Some("Heat".to_string()),
            year: Some(1995),
            duration: Some(10_200.0),
            size: Some(4_000_000_000),
            category: Some("movie".to_string()),
            ..MediaInput::new("/movies/heat.mkv")
        };
        let added = engine.add_media(input).unwrap();
        engine.close().unwrap();
        added
    };

    let engine = open(&tmp);
    let loaded = engine.get_media(added.id()).unwrap();

    assert_eq!(loaded, added);
    assert_eq!(loaded.media().duration_formatted.as_deref(), Some("2h 50m"));
    assert_eq!(engine.data().config.categories.get("movie"), Some(&1));
}

#[test]
fn test_add_routes_series_inputs_to_episodes() {
    let tmp = TempDir::new().unwrap();
    let mut engine = open(&tmp);
    let series = engine.add_series(SeriesInput::named("Foo")).unwrap();

    let input = MediaInput {
        category: Some("series".to_string()),
        series_id: Some(series.id.clone()),
        ..MediaInput::new("/tv/foo/e1.mkv")
    };
    let record = engine.add_media(input).unwrap();

    assert!(record.is_episode());
    assert!(engine.list_unique_medias().is_empty());
    assert_eq!(engine.list_episodes(Some(series.id.as_str())).len(), 1);
    assert_eq!(engine.list_episodes(Some("series_other")).len(), 0);
}

#[test]
fn test_end_to_end_series_scenario() {
    let tmp = TempDir::new().unwrap();
    let mut engine = open(&tmp);

    let series = engine.add_series(SeriesInput::named("Foo")).unwrap();
    let episode = engine
        .add_episode_to_series(MediaInput {
            series_id: Some(series.id.clone()),
            episode_number: Some(1),
            ..MediaInput::new("/a.mkv")
        })
        .unwrap();

    assert_eq!(engine.data().series(&series.id).unwrap().episode_count, 1);
    let seasons = engine.get_series_seasons(&series.id).unwrap();
    assert_eq!(seasons[0].order, 0);
    assert_eq!(seasons[0].episodes, vec![EpisodeRef::Id(episode.media.id.clone())]);

    let first = Season {
        season_number: Some(1),
        episode_range: Some(EpisodeRange { from: 1, to: 1 }),
        episodes: vec![EpisodeRef::Index(0)],
        ..Season::standard(1, "Season 1")
    };
    let saved = engine
        .save_series_seasons(&series.id, vec![seasons[0].clone(), first])
        .unwrap();

    assert!(saved[0].episodes.is_empty());
    assert_eq!(saved[1].episodes, vec![EpisodeRef::Id(episode.media.id.clone())]);
    assert_eq!(saved[1].kind, SeasonKind::Standard);

    engine.close().unwrap();

    let reopened = open(&tmp);
    let seasons = reopened.get_series_seasons(&series.id).unwrap();
    assert!(seasons[0].episodes.is_empty());
    assert_eq!(seasons[1].episode_ids(), vec![episode.media.id.as_str()]);
}

#[test]
fn test_duplicate_path_leaves_disk_unchanged() {
    let tmp = TempDir::new().unwrap();
    let mut engine = open(&tmp);
    engine.add_media(MediaInput::new("/movies/a.mkv")).unwrap();

    let result = engine.add_media(MediaInput::new("/movies/a.mkv"));

    assert!(matches!(result, Err(VideothequeError::DuplicatePath(_))));
    assert_eq!(read_doc(&tmp, "medias_uniques.json").as_array().unwrap().len(), 1);
}

#[test]
fn test_config_saves_are_coalesced() {
    let tmp = TempDir::new().unwrap();
    let fs = Arc::new(CountingFs::default());
    let engine = Engine::open_with(config(&tmp), fs.clone()).unwrap();
    let before = fs.writes_to("app_config.json");

    let handles: Vec<_> = (0..10).map(|_| engine.save_config().unwrap()).collect();
    for handle in handles {
        handle.wait().unwrap();
    }

    assert_eq!(fs.writes_to("app_config.json") - before, 1);
}

#[test]
fn test_failed_rename_keeps_previous_document() {
    let tmp = TempDir::new().unwrap();
    let fs = Arc::new(CrashingFs::default());
    let mut engine = Engine::open_with(config(&tmp), fs.clone()).unwrap();
    engine.add_media(MediaInput::new("/movies/a.mkv")).unwrap();

    fs.crash_before_rename(true);
    let result = engine.add_media(MediaInput::new("/movies/b.mkv"));
    assert!(matches!(result, Err(VideothequeError::Write(_))));
    // Memory is not rolled back.
    assert_eq!(engine.data().unique_medias.len(), 2);
    drop(engine);

    let database = tmp.path().join("database");
    assert!(!database.join("medias_uniques.json.tmp").exists());

    let reopened = open(&tmp);
    assert_eq!(reopened.list_unique_medias().len(), 1);
    assert_eq!(reopened.list_unique_medias()[0].path, "/movies/a.mkv");
}

#[test]
fn test_delete_removes_thumbnail_and_is_coalesced() {
    let tmp = TempDir::new().unwrap();
    let mut engine = open(&tmp);
    let thumb = tmp.path().join("thumbnails").join("thumb_1700000000.jpg");
    std::fs::write(&thumb, b"jpeg").unwrap();

    let input = MediaInput {
        thumbnail: Some("thumb_1700000000.jpg".to_string()),
        ..MediaInput::new("/movies/a.mkv")
    };
    let added = engine.add_media(input).unwrap();
    let missing_thumb = MediaInput {
        thumbnail: Some("thumb_gone.jpg".to_string()),
        ..MediaInput::new("/movies/b.mkv")
    };
    let other = engine.add_media(missing_thumb).unwrap();

    engine.delete_media(added.id()).unwrap();
    assert!(!thumb.exists());
    // A missing thumbnail never fails the delete.
    engine.delete_media(other.id()).unwrap();

    engine.flush().unwrap();
    assert_eq!(read_doc(&tmp, "medias_uniques.json").as_array().unwrap().len(), 0);
    assert!(matches!(
        engine.delete_media(added.id()),
        Err(VideothequeError::MediaNotFound(_))
    ));
}

#[test]
fn test_update_media_persists_merge() {
    let tmp = TempDir::new().unwrap();
    let mut engine = open(&tmp);
    let added = engine.add_media(MediaInput::new("/movies/a.mkv")).unwrap();

    let patch = json!({"path": "/movies/a.mkv", "title": "Renamed", "rating": 4.5});
    engine.update_media(patch.as_object().unwrap()).unwrap();

    let doc = read_doc(&tmp, "medias_uniques.json");
    assert_eq!(doc[0]["id"], added.id());
    assert_eq!(doc[0]["title"], "Renamed");
    assert_eq!(doc[0]["rating"], 4.5);
}

#[test]
fn test_import_skips_duplicates() {
    let tmp = TempDir::new().unwrap();
    let mut engine = open(&tmp);
    engine.add_media(MediaInput::new("/movies/a.mkv")).unwrap();

    let orphan_episode = MediaInput {
        category: Some("series".to_string()),
        series_id: Some("series_missing".to_string()),
        ..MediaInput::new("/tv/x.mkv")
    };
    let summary = engine
        .import_medias(vec![
            MediaInput::new("/movies/a.mkv"),
            MediaInput::new("/movies/b.mkv"),
            MediaInput::new("/movies/c.mkv"),
            orphan_episode,
        ])
        .unwrap();

    assert_eq!(summary, ImportSummary { added: 2, skipped: 1, failed: 1 });
    assert_eq!(read_doc(&tmp, "medias_uniques.json").as_array().unwrap().len(), 3);
}

#[test]
fn test_delete_never_removes_files_outside_thumbnails() {
    let tmp = TempDir::new().unwrap();
    let outside = tmp.path().join("precious.txt");
    std::fs::write(&outside, b"keep me").unwrap();
    let escaping = tmp.path().join("other.txt");
    std::fs::write(&escaping, b"keep me too").unwrap();

    std::fs::create_dir_all(tmp.path().join("database")).unwrap();
    let stored = json!([
        {
            "id": "media_1",
            "path": "/movies/a.mkv",
            "title": "A",
            "thumbnail": outside.to_string_lossy(),
        },
        {
            "id": "media_2",
            "path": "/movies/b.mkv",
            "title": "B",
            "thumbnail": "../other.txt",
        },
    ]);
    std::fs::write(
        tmp.path().join("database").join("medias_uniques.json"),
        serde_json::to_vec(&stored).unwrap(),
    )
    .unwrap();

    let mut engine = open(&tmp);
    engine.delete_media("media_1").unwrap();
    engine.delete_media("media_2").unwrap();
    engine.close().unwrap();

    assert!(outside.exists());
    assert!(escaping.exists());
    assert_eq!(read_doc(&tmp, "medias_uniques.json").as_array().unwrap().len(), 0);
}

#[test]
fn test_tag_cascade_is_persisted() {
    let tmp = TempDir::new().unwrap();
    let mut engine = open(&tmp);
    engine.add_custom_tag("noir").unwrap();
    for path in ["/m/1.mkv", "/m/2.mkv", "/m/3.mkv"] {
        let MediaRecord::Unique(item) = engine.add_media(MediaInput::new(path)).unwrap() else {
            panic!("expected a standalone media");
        };
        engine
            .add_tags_to_media(&item.id, &["noir".to_string()], TagBucket::PersonalTags)
            .unwrap();
    }
    let query = vec!["noir".to_string()];
    assert_eq!(engine.search_by_tags(&query, TagOperator::And).len(), 3);

    engine.remove_custom_tag("noir").unwrap();
    engine.close().unwrap();

    let reopened = open(&tmp);
    assert!(reopened.search_by_tags(&query, TagOperator::Or).is_empty());
    assert!(!reopened.get_tag_catalog().tag_stats.contains_key("noir"));
    assert!(!reopened.get_tag_catalog().custom_tags.contains("noir"));
}

#[test]
fn test_clear_all_removes_thumbnails() {
    let tmp = TempDir::new().unwrap();
    let mut engine = open(&tmp);
    std::fs::write(tmp.path().join("thumbnails").join("thumb_1.jpg"), b"jpeg").unwrap();
    std::fs::write(tmp.path().join("thumbnails").join("thumb_2.jpg"), b"jpeg").unwrap();
    engine.add_media(MediaInput::new("/movies/a.mkv")).unwrap();
    engine.add_series(SeriesInput::named("Foo")).unwrap();

    let summary = engine.clear_all_medias().unwrap();

    assert_eq!(summary.medias_removed, 1);
    assert_eq!(summary.series_removed, 1);
    assert_eq!(summary.thumbnails_removed, 2);
    assert_eq!(read_doc(&tmp, "series_metadata.json").as_array().unwrap().len(), 0);
    assert_eq!(read_doc(&tmp, "app_config.json")["settings"]["totalMedias"], 0);
}

#[test]
fn test_open_heals_stale_counters() {
    let tmp = TempDir::new().unwrap();
    let series_id = {
        let mut engine = open(&tmp);
        let series = engine.add_series(SeriesInput::named("Foo")).unwrap();
        engine
            .add_episode_to_series(MediaInput {
                series_id: Some(series.id.clone()),
                ..MediaInput::new("/tv/foo/e1.mkv")
            })
            .unwrap();
        engine.close().unwrap();
        series.id
    };

    // Simulate a crash after the episodes file but before metadata and config.
    let metadata_path = tmp.path().join("database").join("series_metadata.json");
    let mut metadata = read_doc(&tmp, "series_metadata.json");
    metadata[0]["episodeCount"] = json!(0);
    std::fs::write(&metadata_path, serde_json::to_vec(&metadata).unwrap()).unwrap();

    let engine = open(&tmp);
    assert_eq!(engine.data().series(&series_id).unwrap().episode_count, 1);

    engine.close().unwrap();
    assert_eq!(read_doc(&tmp, "series_metadata.json")[0]["episodeCount"], 1);
}

#[test]
fn test_record_scan_stamps_last_scan() {
    let tmp = TempDir::new().unwrap();
    let mut engine = open(&tmp);

    engine.record_scan().unwrap().wait().unwrap();

    assert!(read_doc(&tmp, "app_config.json")["settings"]["lastScan"].is_string());
}

#[test]
fn test_cleanup_corrupted_series_persists() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("database")).unwrap();
    let raw = json!([{"id": "series_1", "name": "Good"}, {"name": "Broken"}]);
    std::fs::write(
        tmp.path().join("database").join("series_metadata.json"),
        serde_json::to_vec(&raw).unwrap(),
    )
    .unwrap();

    let mut engine = open(&tmp);
    assert_eq!(engine.list_series().len(), 2, "Repair is never implicit");

    assert_eq!(engine.cleanup_corrupted_series().unwrap(), 1);
    assert_eq!(read_doc(&tmp, "series_metadata.json").as_array().unwrap().len(), 1);
}
