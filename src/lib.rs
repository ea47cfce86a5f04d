// Place Discovery - intent-driven place search over a catalog and a personalized provider
//
// Core layers:
// - providers: HTTP clients for the catalog and personalized APIs
// - normalizer: provider JSON to canonical models
// - cache: saved user records with an in-memory mirror
// - search: intent classification, dispatch, ranking and published results

// Performance logging macros - exported for use by other modules
#[macro_use]
pub mod macros;

pub mod cache;
pub mod collaborators;
pub mod config;
pub mod credentials;
pub mod database;
pub mod intent;
pub mod models;
pub mod normalizer;
pub mod providers;
pub mod search;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::DiscoveryConfig;
pub use search::{SearchError, SearchOrchestrator, SearchSnapshot};
pub use state::AppState;

/// Initialize env_logger on stderr (reads RUST_LOG, defaults to info).
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
