// Application state - builds every component once and hands out shared references

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::cache::{CacheGateway, OperationTracker};
use crate::collaborators::{FixedLocationProvider, LogAnalytics, StaticEntitlement};
use crate::config::DiscoveryConfig;
use crate::credentials::{CredentialResolver, SqliteCredentialStore};
use crate::database::DatabaseManager;
use crate::models::Coordinate;
use crate::providers::{
    CatalogClient, HttpTransport, ManagedUserClient, PersonalizedClient, ReqwestTransport,
    SessionRetryGate,
};
use crate::search::SearchOrchestrator;

/// Wrapper around DatabaseManager for shared access
pub struct DbWrapper {
    inner: Arc<DatabaseManager>,
}

impl DbWrapper {
    pub fn new(db: DatabaseManager) -> Self {
        Self {
            inner: Arc::new(db),
        }
    }

    pub fn arc(&self) -> Arc<DatabaseManager> {
        self.inner.clone()
    }
}

impl std::ops::Deref for DbWrapper {
    type Target = DatabaseManager;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub struct AppState {
    pub config: Arc<DiscoveryConfig>,
    /// SQLite store for saved records, keys and managed identities
    database: DbWrapper,
    pub credentials: Arc<CredentialResolver>,
    pub catalog: Arc<CatalogClient>,
    pub personalized: Arc<PersonalizedClient>,
    pub cache: Arc<CacheGateway>,
    pub tracker: Arc<OperationTracker>,
    pub entitlement: Arc<StaticEntitlement>,
    pub location: Arc<FixedLocationProvider>,
    pub orchestrator: Arc<SearchOrchestrator>,
}

impl AppState {
    pub fn new(
        config: DiscoveryConfig,
        personalized_access: bool,
        location: Option<Coordinate>,
    ) -> Result<Self> {
        let config = Arc::new(config);

        let db = DatabaseManager::from_config(&config)
            .context("Failed to open discovery database")?;
        let database = DbWrapper::new(db);
        log::info!("Database ready at {}", database.db_path().display());

        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestTransport::new(&config).context("Failed to build HTTP client")?);

        let store = Arc::new(SqliteCredentialStore::new(database.arc()));
        let provisioner = Arc::new(ManagedUserClient::new(config.clone(), transport.clone()));
        let credentials = Arc::new(CredentialResolver::new(
            store.clone(),
            store,
            provisioner,
            config.personalized_service.clone(),
        ));

        let retry_gate = Arc::new(SessionRetryGate::default());
        let catalog = Arc::new(CatalogClient::new(
            config.clone(),
            transport.clone(),
            credentials.clone(),
            retry_gate.clone(),
        ));
        let personalized = Arc::new(PersonalizedClient::new(
            config.clone(),
            transport,
            credentials.clone(),
            retry_gate,
        ));

        let tracker = Arc::new(OperationTracker::new(config.background_grace()));
        let cache = Arc::new(CacheGateway::new(database.arc(), tracker.clone()));

        let entitlement = Arc::new(StaticEntitlement::new(personalized_access));
        let location = Arc::new(FixedLocationProvider::new(location));

        let orchestrator = Arc::new(SearchOrchestrator::new(
            config.clone(),
            catalog.clone(),
            personalized.clone(),
            cache.clone(),
            location.clone(),
            entitlement.clone(),
            Arc::new(LogAnalytics),
        ));

        Ok(Self {
            config,
            database,
            credentials,
            catalog,
            personalized,
            cache,
            tracker,
            entitlement,
            location,
            orchestrator,
        })
    }

    pub fn db(&self) -> &DatabaseManager {
        &self.database
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{IntentType, SearchFilters};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_state_wires_components() {
        let dir = tempdir().unwrap();
        let config = DiscoveryConfig {
            db_path: dir.path().join("discovery.db"),
            ..Default::default()
        };

        let state = AppState::new(config, false, Some(Coordinate::new(40.0, -73.0))).unwrap();
        assert!(state.db().db_path().exists());
        state.orchestrator.load_initial_data().await.unwrap();

        // no service key stored, so the catalog search fails without touching the network
        let result = state
            .orchestrator
            .search("coffee", Some(IntentType::GeneralSearch), &SearchFilters::default())
            .await;
        assert!(result.is_err());
        assert!(state.orchestrator.snapshot().await.places.is_empty());
    }
}
