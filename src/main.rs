// discover - command-line front end for the place discovery core

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use place_discovery::database::{CachedUserRecord, RecordGroup};
use place_discovery::intent::{IntentType, SearchFilters};
use place_discovery::models::Coordinate;
use place_discovery::{init_logging, AppState, DiscoveryConfig};

#[derive(Parser)]
#[command(name = "discover")]
#[command(about = "Search places through the catalog and personalized providers")]
#[command(version)]
struct Args {
    /// Latitude of the current location
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the current location
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Use the personalized provider
    #[arg(long)]
    personalized: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a search turn and print the published results
    Search {
        caption: String,
        /// Search radius in kilometres
        #[arg(long)]
        distance_km: Option<f64>,
        #[arg(long)]
        open_now: bool,
        /// Treat the caption as an autocomplete query
        #[arg(long)]
        autocomplete: bool,
    },
    /// Search, then open the result at `index` with details, tips and photos
    Details {
        caption: String,
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
    /// Look up destination candidates
    Locations { caption: String },
    /// Fetch a page of taste suggestions
    Tastes {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Manage stored service keys
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Manage saved records
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    Set { service: String, value: String },
    Delete { service: String },
}

#[derive(Subcommand)]
enum SavedAction {
    List { group: String },
    Add {
        group: String,
        identity: String,
        title: String,
        #[arg(long, default_value_t = 1.0)]
        rating: f64,
    },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let location = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        (None, None) => None,
        _ => bail!("--lat and --lon must be given together"),
    };

    let config = DiscoveryConfig::load().context("Failed to load configuration")?;
    let state = AppState::new(config, args.personalized, location)?;

    match args.command {
        Command::Search {
            caption,
            distance_km,
            open_now,
            autocomplete,
        } => {
            let filters = SearchFilters {
                distance_km,
                open_now: open_now.then_some(true),
            };
            let kind = autocomplete.then_some(IntentType::AutocompleteSearch);
            if let Err(e) = state.orchestrator.load_initial_data().await {
                log::warn!("Continuing without saved data: {}", e);
            }
            state.orchestrator.search(&caption, kind, &filters).await?;
            print_json(&state.orchestrator.snapshot().await)?;
        }
        Command::Details { caption, index } => {
            state
                .orchestrator
                .search(&caption, None, &SearchFilters::default())
                .await?;
            let snapshot = state.orchestrator.snapshot().await;
            let Some(result) = snapshot.places.get(index) else {
                bail!("No result at index {} ({} results)", index, snapshot.places.len());
            };
            state.orchestrator.select_place(result.id).await?;

            let snapshot = state.orchestrator.snapshot().await;
            let selected = snapshot
                .places
                .iter()
                .find(|r| r.place_id() == snapshot.selected_place_id.as_deref());
            print_json(&selected)?;
        }
        Command::Locations { caption } => {
            state.orchestrator.autocomplete_locations(&caption).await?;
            print_json(&state.orchestrator.location_results().await)?;
        }
        Command::Tastes { page } => {
            let added = state.orchestrator.refresh_tastes(page).await?;
            log::info!("Added {} tastes", added);
            print_json(&state.orchestrator.snapshot().await.tastes)?;
        }
        Command::Key { action } => match action {
            KeyAction::Set { service, value } => {
                state.db().set_key_string(&service, &value)?;
                println!("Stored key for {}", service);
            }
            KeyAction::Delete { service } => {
                let removed = state.db().delete_key_string(&service)?;
                println!("{}", if removed { "Deleted" } else { "No key stored" });
            }
        },
        Command::Saved { action } => {
            state.cache.refresh(|_| {}).await?;
            match action {
                SavedAction::List { group } => {
                    let group: RecordGroup = group.parse()?;
                    print_json(&state.cache.sorted_results(group).await)?;
                }
                SavedAction::Add {
                    group,
                    identity,
                    title,
                    rating,
                } => {
                    let record = CachedUserRecord::new(group.parse()?, identity, title).with_rating(rating);
                    let id = state.cache.store(record).await?;
                    println!("Saved {}", id);
                }
                SavedAction::Clear => {
                    let removed = state.cache.delete_all_user_cached_groups().await?;
                    println!("Removed {} records", removed);
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
