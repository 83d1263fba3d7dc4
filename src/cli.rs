// Videotheque CLI binary

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use videotheque_lib::constants::DEFAULT_SUGGESTION_LIMIT;
use videotheque_lib::models::{MediaInput, Season, SeriesInput, SeriesUpdate, TagBucket};
use videotheque_lib::{Engine, EngineConfig, OpResponse, TagOperator};

#[derive(Parser)]
#[command(name = "videotheque")]
#[command(about = "Videotheque - manage a personal media library store", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory (defaults to ~/.videotheque)
    #[arg(long, global = true, env = "VIDEOTHEQUE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Debounce window for coalesced saves, in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a media (JSON input, or just a path)
    Add {
        /// File path of the media
        path: String,
        /// Extra fields as a JSON object
        #[arg(long)]
        json: Option<String>,
    },

    /// Import medias from a JSON array file
    Import {
        file: PathBuf,
    },

    /// Merge fields into the media with the same path
    Update {
        /// JSON object containing at least "path"
        json: String,
    },

    /// Delete a media or episode
    Delete {
        id: String,
    },

    /// Show one media
    Show {
        id: String,
    },

    /// List standalone medias
    List,

    /// Search titles and descriptions
    Search {
        query: String,
    },

    /// Library statistics
    Stats,

    /// Remove every media, series and thumbnail
    Clear {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Stamp the last scan time
    Scanned,

    /// Drop series records stored without an id
    Repair,

    /// Manage series and episodes
    #[command(subcommand)]
    Series(SeriesCommands),

    /// Manage seasons
    #[command(subcommand)]
    Seasons(SeasonCommands),

    /// Manage tags
    #[command(subcommand)]
    Tags(TagCommands),
}

#[derive(Subcommand)]
enum SeriesCommands {
    /// Create a series
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Update a series from a JSON object
    Update {
        id: String,
        json: String,
    },
    /// Delete a series without episodes
    Delete {
        id: String,
    },
    /// Show a series with its episodes grouped by season
    Show {
        id: String,
    },
    /// List all series
    List,
    /// Add an episode
    Episode {
        series_id: String,
        path: String,
        #[arg(long)]
        season: Option<u32>,
        #[arg(long)]
        episode: Option<u32>,
    },
}

#[derive(Subcommand)]
enum SeasonCommands {
    /// Show the season partition of a series
    Show {
        series_id: String,
    },
    /// Replace the season list from a JSON file
    Save {
        series_id: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Create or edit one season
    Set {
        series_id: String,
        order: u32,
        #[arg(long, default_value = "")]
        name: String,
        /// 1-based range "from-to"
        #[arg(long)]
        range: Option<String>,
    },
    /// Delete one season
    Delete {
        series_id: String,
        season_id: String,
    },
    /// Rebuild the Unassigned season
    Recompute {
        series_id: String,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// Register a custom tag
    AddCustom {
        name: String,
    },
    /// Remove a custom tag everywhere
    RemoveCustom {
        name: String,
    },
    /// Tag a media
    Add {
        media_id: String,
        tags: Vec<String>,
        #[arg(long, default_value = "personalTags")]
        bucket: String,
    },
    /// Untag a media
    Remove {
        media_id: String,
        tags: Vec<String>,
        #[arg(long, default_value = "personalTags")]
        bucket: String,
    },
    /// Find medias by tags
    Search {
        tags: Vec<String>,
        /// AND or OR
        #[arg(long, default_value = "AND")]
        operator: String,
    },
    /// Suggest tags for a partial input
    Suggest {
        query: String,
        #[arg(long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
        limit: usize,
    },
    /// Most used tags
    Popular {
        #[arg(long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
        limit: usize,
    },
    /// Show the tag catalog
    Catalog,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match cli.data_dir {
        Some(dir) => EngineConfig::new(dir),
        None => EngineConfig::default(),
    };
    if let Some(delay) = cli.delay {
        config = config.with_save_delay(Duration::from_millis(delay));
    }

    let mut engine = Engine::open(config).context("Failed to open library")?;

    match cli.command {
        Commands::Add { path, json } => cmd_add(&mut engine, path, json)?,
        Commands::Import { file } => cmd_import(&mut engine, file)?,
        Commands::Update { json } => {
            let patch: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&json).context("Update expects a JSON object")?;
            respond(engine.update_media(&patch))?;
        }
        Commands::Delete { id } => respond(engine.delete_media(&id))?,
        Commands::Show { id } => respond(engine.get_media(&id))?,
        Commands::List => print(OpResponse::ok(engine.list_unique_medias()))?,
        Commands::Search { query } => print(OpResponse::ok(engine.search_medias(&query)))?,
        Commands::Stats => print(OpResponse::ok(engine.get_stats()))?,
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to clear the library without --yes");
            }
            respond(engine.clear_all_medias())?;
        }
        Commands::Scanned => {
            engine.record_scan()?.wait()?;
            print(OpResponse::ok(&engine.data().config.settings))?;
        }
        Commands::Repair => {
            let response: OpResponse<usize> = engine.cleanup_corrupted_series().into();
            print(response.with_message("Repair pass finished"))?;
        }
        Commands::Series(command) => cmd_series(&mut engine, command)?,
        Commands::Seasons(command) => cmd_seasons(&mut engine, command)?,
        Commands::Tags(command) => cmd_tags(&mut engine, command)?,
    }

    engine.close()?;
    Ok(())
}

fn print<T: Serialize>(response: OpResponse<T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn respond<T: Serialize>(result: videotheque_lib::Result<T>) -> Result<()> {
    let response: OpResponse<T> = result.into();
    print(response)
}

fn cmd_add(engine: &mut Engine, path: String, json: Option<String>) -> Result<()> {
    let mut fields: serde_json::Map<String, serde_json::Value> = match json {
        Some(raw) => serde_json::from_str(&raw).context("Invalid media JSON")?,
        None => serde_json::Map::new(),
    };
    fields.insert("path".to_string(), serde_json::Value::String(path));
    let input: MediaInput = serde_json::from_value(serde_json::Value::Object(fields))?;

    respond(engine.add_media(input))
}

fn cmd_import(engine: &mut Engine, file: PathBuf) -> Result<()> {
    let raw = std::fs::read(&file).with_context(|| format!("Cannot read {}", file.display()))?;
    let inputs: Vec<MediaInput> = serde_json::from_slice(&raw).context("Import expects a JSON array")?;

    respond(engine.import_medias(inputs))
}

fn cmd_series(engine: &mut Engine, command: SeriesCommands) -> Result<()> {
    match command {
        SeriesCommands::Add { name, description } => {
            let input = SeriesInput {
                description,
                ..SeriesInput::named(name)
            };
            respond(engine.add_series(input))
        }
        SeriesCommands::Update { id, json } => {
            let update: SeriesUpdate = serde_json::from_str(&json).context("Invalid series JSON")?;
            respond(engine.update_series(&id, update))
        }
        SeriesCommands::Delete { id } => respond(engine.delete_series(&id)),
        SeriesCommands::Show { id } => respond(engine.get_series_by_id(&id)),
        SeriesCommands::List => print(OpResponse::ok(engine.list_series())),
        SeriesCommands::Episode {
            series_id,
            path,
            season,
            episode,
        } => {
            let input = MediaInput {
                series_id: Some(series_id),
                season_number: season,
                episode_number: episode,
                ..MediaInput::new(path)
            };
            respond(engine.add_episode_to_series(input))
        }
    }
}

fn parse_range(raw: &str) -> Result<(u32, u32)> {
    let (from, to) = raw
        .split_once('-')
        .with_context(|| format!("Range must look like 1-4, got {}", raw))?;
    Ok((from.trim().parse()?, to.trim().parse()?))
}

fn cmd_seasons(engine: &mut Engine, command: SeasonCommands) -> Result<()> {
    match command {
        SeasonCommands::Show { series_id } => respond(engine.get_series_seasons(&series_id)),
        SeasonCommands::Save { series_id, file } => {
            let raw = std::fs::read(&file).with_context(|| format!("Cannot read {}", file.display()))?;
            let seasons: Vec<Season> = serde_json::from_slice(&raw).context("Invalid seasons JSON")?;
            respond(engine.save_series_seasons(&series_id, seasons))
        }
        SeasonCommands::Set {
            series_id,
            order,
            name,
            range,
        } => {
            let mut season = Season::standard(order, name);
            if let Some(raw) = range {
                let (from, to) = parse_range(&raw)?;
                season.episode_range = Some(videotheque_lib::models::EpisodeRange { from, to });
            }
            // Editing keeps the id of the season already holding this order.
            if let Ok(existing) = engine.get_series_seasons(&series_id) {
                if let Some(current) = existing.iter().find(|s| s.order == order && !s.is_unassigned()) {
                    season.id = current.id.clone();
                }
            }
            respond(engine.save_season(&series_id, season))
        }
        SeasonCommands::Delete { series_id, season_id } => {
            respond(engine.delete_season(&series_id, &season_id))
        }
        SeasonCommands::Recompute { series_id } => {
            respond(engine.recompute_default_season(&series_id))
        }
    }
}

fn cmd_tags(engine: &mut Engine, command: TagCommands) -> Result<()> {
    match command {
        TagCommands::AddCustom { name } => respond(engine.add_custom_tag(&name)),
        TagCommands::RemoveCustom { name } => respond(engine.remove_custom_tag(&name)),
        TagCommands::Add { media_id, tags, bucket } => {
            let bucket: TagBucket = bucket.parse()?;
            respond(engine.add_tags_to_media(&media_id, &tags, bucket))
        }
        TagCommands::Remove { media_id, tags, bucket } => {
            let bucket: TagBucket = bucket.parse()?;
            respond(engine.remove_tags_from_media(&media_id, &tags, bucket))
        }
        TagCommands::Search { tags, operator } => {
            let operator: TagOperator = operator.parse()?;
            print(OpResponse::ok(engine.search_by_tags(&tags, operator)))
        }
        TagCommands::Suggest { query, limit } => {
            print(OpResponse::ok(engine.get_tag_suggestions(&query, limit)))
        }
        TagCommands::Popular { limit } => print(OpResponse::ok(engine.get_popular_tags(limit))),
        TagCommands::Catalog => print(OpResponse::ok(engine.get_tag_catalog())),
    }
}
