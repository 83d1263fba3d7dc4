// Season partition: every episode of a series belongs to exactly one season

use std::collections::HashSet;

use crate::constants::{DEFAULT_SEASON_ID, SEASON_ID_PREFIX};
use crate::error::{Result, VideothequeError};
use crate::ids::generate_id;
use crate::models::{EpisodeRef, Season, SeasonKind};
use super::LibraryData;

/// Rebuild the membership of `seasons` against the series' episode ids.
///
/// Guarantees afterwards:
/// - exactly one order-0 season exists, first in the list
/// - seasons are sorted by order
/// - non-default seasons only reference live episode ids, each id at most once
///   across all of them (lowest order keeps a contested id)
/// - the default season holds every remaining id, in collection order
pub fn partition(seasons: &mut Vec<Season>, episode_ids: &[String]) {
    let mut default_seen = false;
    seasons.retain(|s| {
        if !s.is_unassigned() {
            return true;
        }
        !std::mem::replace(&mut default_seen, true)
    });
    if !default_seen {
        seasons.push(Season::unassigned());
    }
    seasons.sort_by_key(|s| s.order);

    let live: HashSet<&str> = episode_ids.iter().map(String::as_str).collect();
    let mut claimed: HashSet<String> = HashSet::new();

    for season in seasons.iter_mut().filter(|s| !s.is_unassigned()) {
        let mut kept = Vec::with_capacity(season.episodes.len());
        for entry in &season.episodes {
            let id = match entry {
                EpisodeRef::Id(id) if live.contains(id.as_str()) => id.clone(),
                EpisodeRef::Index(index) => match episode_ids.get(*index) {
                    Some(id) => id.clone(),
                    None => continue,
                },
                EpisodeRef::Id(_) => continue,
            };
            if claimed.insert(id.clone()) {
                kept.push(EpisodeRef::Id(id));
            }
        }
        season.episodes = kept;
    }

    if let Some(default) = seasons.first_mut() {
        let unassigned = Season::unassigned();
        default.id = unassigned.id;
        default.kind = unassigned.kind;
        default.name = unassigned.name;
        default.editable = false;
        default.season_number = None;
        default.episode_range = None;
        default.episodes = episode_ids
            .iter()
            .filter(|id| !claimed.contains(*id))
            .map(|id| EpisodeRef::Id(id.clone()))
            .collect();
    }
}

/// Recompute the default season of one series from its current episodes.
/// Creates the season list if the series has none yet.
pub fn recompute_default_season(data: &mut LibraryData, series_id: &str) {
    if data.series(series_id).is_none() {
        return;
    }

    let episode_ids = data.series_episode_ids(series_id);
    let seasons = data.series_seasons.entry(series_id.to_string()).or_default();
    partition(seasons, &episode_ids);
}

/// Reject lists that reuse an order or try to add a second default season.
pub fn validate_orders(seasons: &[Season]) -> Result<()> {
    let mut orders = HashSet::new();
    let mut default_count = 0;

    for season in seasons {
        if season.is_unassigned() {
            default_count += 1;
            if default_count > 1 {
                return Err(VideothequeError::ReservedSeason(season.name.clone()));
            }
            continue;
        }
        if season.kind == SeasonKind::Unassigned || season.id == DEFAULT_SEASON_ID {
            return Err(VideothequeError::ReservedSeason(season.name.clone()));
        }
        if !orders.insert(season.order) {
            return Err(VideothequeError::SeasonOrderConflict(season.order));
        }
    }

    Ok(())
}

/// Ids at the 1-based positions `from..=to` of the series' episodes.
pub fn resolve_range(from: u32, to: u32, episode_ids: &[String]) -> Vec<EpisodeRef> {
    if from == 0 || to < from {
        return Vec::new();
    }
    episode_ids
        .iter()
        .skip(from as usize - 1)
        .take((to - from + 1) as usize)
        .map(|id| EpisodeRef::Id(id.clone()))
        .collect()
}

/// Fill in id and name, and resolve a range-only membership.
fn prepare(season: &mut Season, episode_ids: &[String]) {
    if season.id.trim().is_empty() {
        season.id = generate_id(SEASON_ID_PREFIX);
    }
    if season.name.trim().is_empty() {
        season.name = format!("Season {}", season.order);
    }
    season.editable = true;

    if season.episodes.is_empty() {
        if let Some(range) = season.episode_range {
            season.episodes = resolve_range(range.from, range.to, episode_ids);
        }
    }
}

fn require_series(data: &LibraryData, series_id: &str) -> Result<()> {
    data.series(series_id)
        .map(|_| ())
        .ok_or_else(|| VideothequeError::SeriesNotFound(series_id.to_string()))
}

/// Replace the whole season list of a series. The default season is rebuilt;
/// whatever membership the caller sent for it is ignored.
pub fn save_series_seasons(
    data: &mut LibraryData,
    series_id: &str,
    mut seasons: Vec<Season>,
) -> Result<Vec<Season>> {
    require_series(data, series_id)?;
    validate_orders(&seasons)?;

    let episode_ids = data.series_episode_ids(series_id);
    for season in seasons.iter_mut().filter(|s| !s.is_unassigned()) {
        prepare(season, &episode_ids);
    }
    partition(&mut seasons, &episode_ids);

    data.series_seasons.insert(series_id.to_string(), seasons.clone());
    Ok(seasons)
}

/// Create or edit one non-default season.
pub fn save_season(data: &mut LibraryData, series_id: &str, mut season: Season) -> Result<Season> {
    require_series(data, series_id)?;
    if season.is_unassigned() || season.kind == SeasonKind::Unassigned || season.id == DEFAULT_SEASON_ID {
        return Err(VideothequeError::ReservedSeason(season.name));
    }

    let episode_ids = data.series_episode_ids(series_id);
    let seasons = data.series_seasons.entry(series_id.to_string()).or_default();

    let conflict = seasons
        .iter()
        .any(|s| s.order == season.order && (season.id.is_empty() || s.id != season.id));
    if conflict {
        return Err(VideothequeError::SeasonOrderConflict(season.order));
    }

    prepare(&mut season, &episode_ids);
    let id = season.id.clone();
    match seasons.iter_mut().find(|s| s.id == id) {
        Some(existing) => *existing = season,
        None => seasons.push(season),
    }
    partition(seasons, &episode_ids);

    seasons
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .ok_or(VideothequeError::SeasonNotFound(id))
}

/// Delete a non-default season; its episodes fall back to the default season.
pub fn delete_season(data: &mut LibraryData, series_id: &str, season_id: &str) -> Result<Season> {
    require_series(data, series_id)?;

    let episode_ids = data.series_episode_ids(series_id);
    let seasons = data
        .series_seasons
        .get_mut(series_id)
        .ok_or_else(|| VideothequeError::SeasonNotFound(season_id.to_string()))?;

    let index = seasons
        .iter()
        .position(|s| s.id == season_id)
        .ok_or_else(|| VideothequeError::SeasonNotFound(season_id.to_string()))?;
    if seasons[index].is_unassigned() {
        return Err(VideothequeError::ReservedSeason(seasons[index].name.clone()));
    }

    let removed = seasons.remove(index);
    partition(seasons, &episode_ids);

    Ok(removed)
}

/// Current season list of a series, default season first.
pub fn get_series_seasons(data: &LibraryData, series_id: &str) -> Result<Vec<Season>> {
    require_series(data, series_id)?;

    let mut seasons = data.series_seasons.get(series_id).cloned().unwrap_or_default();
    partition(&mut seasons, &data.series_episode_ids(series_id));
    Ok(seasons)
}
