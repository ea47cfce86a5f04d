// Search module - intent dispatch and published results
//
// - orchestrator.rs: SearchOrchestrator, the per-turn search algorithm
// - enrichment.rs: concurrent details / photos / tips fetches
// - ranking.rs: alphabetical, rating and distance ordering
// - results.rs: SearchResult, CategoryResult and the published snapshot
// - locations.rs: destination location lists
// - taxonomy.rs: bundled category taxonomy
// - task_registry.rs: cancellation of superseded searches

pub mod enrichment;
pub mod locations;
pub mod orchestrator;
pub mod ranking;
pub mod results;
pub mod task_registry;
pub mod taxonomy;

use std::time::Duration;
use thiserror::Error;

use crate::cache::CacheError;
use crate::credentials::CredentialError;
use crate::normalizer::NormalizeError;
use crate::providers::ProviderError;

pub use orchestrator::SearchOrchestrator;
pub use results::{section_results, CategoryEntry, CategoryResult, SearchResult, SearchSnapshot};
pub use task_registry::{SearchTaskRegistry, USER_SEARCH_SCOPE};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no destination location selected")]
    MissingSelectedDestinationLocation,
    #[error("no previous intent to continue")]
    MissingLastIntent,
    #[error("session retry already in flight")]
    RetryTimeout,
    #[error("search cancelled")]
    Cancelled,
    #[error("no result with id {0}")]
    UnknownResult(String),
    #[error("cache refresh did not finish within {0:?}")]
    CacheRefreshTimeout(Duration),
    #[error(transparent)]
    Provider(ProviderError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl SearchError {
    /// Provider reported nothing usable rather than failing
    pub fn is_empty_result(&self) -> bool {
        matches!(self, SearchError::Provider(e) if e.is_empty_result())
    }
}

impl From<ProviderError> for SearchError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::RetryTimeout => SearchError::RetryTimeout,
            ProviderError::Cancelled => SearchError::Cancelled,
            other => SearchError::Provider(other),
        }
    }
}
