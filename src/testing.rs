// Shared test doubles: a scripted HTTP transport, in-memory credential stores
// and counting provider / analytics mocks

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::collaborators::AnalyticsSink;
use crate::config::DiscoveryConfig;
use crate::credentials::{
    CredentialError, CredentialResolver, IdentityMirror, KeyStore, ManagedUser, UserProvisioner,
};
use crate::models::{
    Coordinate, LocationResult, Photo, PlaceSummary, RecommendedPlace, TasteSuggestion, Tip,
};
use crate::providers::{
    ApiRequest, CatalogClient, CatalogSearch, HttpTransport, PersonalizedClient, PersonalizedSearch,
    PlaceDetailsRequest, PlaceSearchRequest, ProviderError, RecommendedSearchRequest, SessionRetryGate,
};

type Scripted = Result<Value, ProviderError>;

/// Transport answering from per-path queues.
///
/// A route matches when the request URL ends with its path. The last queued
/// response for a route is replayed for every later call.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<(String, VecDeque<Scripted>)>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, body: Value) {
        self.script(path, Ok(body));
    }

    pub fn fail(&self, path: &str, error: ProviderError) {
        self.script(path, Err(error));
    }

    fn script(&self, path: &str, response: Scripted) {
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|(p, _)| p == path) {
            Some((_, queue)) => queue.push_back(response),
            None => routes.push((path.to_string(), VecDeque::from([response]))),
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(path))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ProviderError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        let mut routes = self.routes.lock().unwrap();
        let queue = routes
            .iter_mut()
            .filter(|(path, _)| url.ends_with(path.as_str()))
            .max_by_key(|(path, _)| path.len())
            .map(|(_, queue)| queue);

        match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Err(ProviderError::Transport(format!("no route for {}", url))),
        }
    }
}

/// Key store backed by a map. A persistent store keeps keys on delete,
/// standing in for a vault that re-issues the same key.
#[derive(Default)]
pub struct MemoryKeys {
    keys: Mutex<HashMap<String, String>>,
    persistent: bool,
    pub lookups: AtomicUsize,
    pub deletions: AtomicUsize,
}

impl MemoryKeys {
    pub fn with(keys: &[(&str, &str)]) -> Self {
        Self {
            keys: Mutex::new(
                keys.iter()
                    .map(|(s, k)| (s.to_string(), k.to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }
}

#[async_trait]
impl KeyStore for MemoryKeys {
    async fn find_key(&self, service: &str) -> Result<Option<String>, CredentialError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.keys.lock().unwrap().get(service).cloned())
    }

    async fn delete_key(&self, service: &str) -> Result<(), CredentialError> {
        self.deletions.fetch_add(1, Ordering::SeqCst);
        if !self.persistent {
            self.keys.lock().unwrap().remove(service);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryIdentities {
    users: Mutex<Vec<ManagedUser>>,
}

impl MemoryIdentities {
    pub fn with(user: ManagedUser) -> Self {
        Self {
            users: Mutex::new(vec![user]),
        }
    }

    pub fn users(&self) -> Vec<ManagedUser> {
        self.users.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityMirror for MemoryIdentities {
    async fn fetch_user(&self, user_id: Option<&str>) -> Result<Option<ManagedUser>, CredentialError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| user_id.map_or(true, |id| u.user_id == id))
            .cloned())
    }

    async fn store_user(&self, user: &ManagedUser) -> Result<(), CredentialError> {
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }
}

/// Provisioner that always hands out the same identity
pub struct FixedProvisioner {
    pub user: ManagedUser,
    pub calls: AtomicUsize,
}

impl FixedProvisioner {
    pub fn new(user_id: &str, token: &str) -> Self {
        Self {
            user: ManagedUser {
                user_id: user_id.to_string(),
                token: token.to_string(),
            },
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl UserProvisioner for FixedProvisioner {
    async fn create_managed_user(&self, _service_key: &str) -> Result<ManagedUser, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.user.clone())
    }
}

pub fn test_config() -> Arc<DiscoveryConfig> {
    Arc::new(DiscoveryConfig {
        api_base: "https://api.test/".to_string(),
        ..Default::default()
    })
}

pub fn standard_keys() -> MemoryKeys {
    MemoryKeys::with(&[("foursquare", "catalog-key"), ("foursquareService", "service-key")])
}

pub fn resolver(keys: MemoryKeys, identities: MemoryIdentities) -> Arc<CredentialResolver> {
    Arc::new(CredentialResolver::new(
        Arc::new(keys),
        Arc::new(identities),
        Arc::new(FixedProvisioner::new("u-new", "new-token")),
        "foursquareService",
    ))
}

pub fn catalog_client_with(transport: Arc<MockTransport>, keys: MemoryKeys) -> CatalogClient {
    CatalogClient::new(
        test_config(),
        transport,
        resolver(keys, MemoryIdentities::default()),
        Arc::new(SessionRetryGate::default()),
    )
}

pub fn catalog_client(transport: Arc<MockTransport>) -> CatalogClient {
    catalog_client_with(transport, standard_keys())
}

pub fn personalized_client_with(
    transport: Arc<MockTransport>,
    identities: MemoryIdentities,
) -> PersonalizedClient {
    PersonalizedClient::new(
        test_config(),
        transport,
        resolver(standard_keys(), identities),
        Arc::new(SessionRetryGate::default()),
    )
}

pub fn personalized_client(transport: Arc<MockTransport>) -> PersonalizedClient {
    personalized_client_with(
        transport,
        MemoryIdentities::with(ManagedUser {
            user_id: "u1".to_string(),
            token: "user-token".to_string(),
        }),
    )
}

/// Catalog mock answering place searches by query, with optional per-query delays
#[derive(Default)]
pub struct MockCatalog {
    places: Mutex<HashMap<String, Vec<PlaceSummary>>>,
    delays: Mutex<HashMap<String, Duration>>,
    details: Mutex<HashMap<String, Value>>,
    pub searches: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub photo_calls: AtomicUsize,
    pub tip_calls: AtomicUsize,
    pub autocompletes: AtomicUsize,
}

impl MockCatalog {
    pub fn with_places(self, query: &str, places: Vec<PlaceSummary>) -> Self {
        self.places.lock().unwrap().insert(query.to_string(), places);
        self
    }

    pub fn with_delay(self, query: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(query.to_string(), delay);
        self
    }

    pub fn with_details(self, place_id: &str, raw: Value) -> Self {
        self.details.lock().unwrap().insert(place_id.to_string(), raw);
        self
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSearch for MockCatalog {
    async fn search(
        &self,
        request: &PlaceSearchRequest,
        _location: Option<Coordinate>,
    ) -> Result<Vec<PlaceSummary>, ProviderError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().unwrap().get(&request.query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .places
            .lock()
            .unwrap()
            .get(&request.query)
            .cloned()
            .unwrap_or_default())
    }

    async fn details(&self, request: &PlaceDetailsRequest) -> Result<Value, ProviderError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .lock()
            .unwrap()
            .get(&request.place_id)
            .cloned()
            .ok_or_else(|| ProviderError::ServerErrorMessage("no details".to_string()))
    }

    async fn photos(&self, place_id: &str) -> Result<Vec<Photo>, ProviderError> {
        self.photo_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Photo {
            id: format!("{}-photo", place_id),
            place_id: place_id.to_string(),
            prefix: "https://img.test/".to_string(),
            suffix: "/a.jpg".to_string(),
            width: 400.0,
            height: 300.0,
            ..Default::default()
        }])
    }

    async fn tips(&self, place_id: &str) -> Result<Vec<Tip>, ProviderError> {
        self.tip_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Tip {
            id: format!("{}-tip", place_id),
            place_id: place_id.to_string(),
            text: "Sit at the counter".to_string(),
            ..Default::default()
        }])
    }

    async fn autocomplete(
        &self,
        caption: &str,
        _limit: Option<u32>,
        _location: Option<Coordinate>,
    ) -> Result<Vec<PlaceSummary>, ProviderError> {
        self.autocompletes.fetch_add(1, Ordering::SeqCst);
        Ok(self.places.lock().unwrap().get(caption).cloned().unwrap_or_default())
    }

    async fn search_locations(
        &self,
        _caption: &str,
        _near: Option<Coordinate>,
    ) -> Result<Vec<LocationResult>, ProviderError> {
        Ok(Vec::new())
    }

    async fn autocomplete_location_results(
        &self,
        caption: &str,
        _location: Option<Coordinate>,
    ) -> Result<Vec<LocationResult>, ProviderError> {
        Ok(vec![LocationResult::new(caption, Some(Coordinate::new(30.27, -97.74)))])
    }

    async fn invalidate_session(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Personalized mock with scripted recommendations
#[derive(Default)]
pub struct MockPersonalized {
    recommendations: Mutex<Option<Result<Vec<RecommendedPlace>, ProviderError>>>,
    related: Mutex<Vec<RecommendedPlace>>,
    tastes: Mutex<Vec<TasteSuggestion>>,
    tastes_error: Mutex<Option<ProviderError>>,
    pub calls: AtomicUsize,
    pub recommend_calls: AtomicUsize,
    pub related_calls: AtomicUsize,
}

impl MockPersonalized {
    pub fn recommending(self, result: Result<Vec<RecommendedPlace>, ProviderError>) -> Self {
        *self.recommendations.lock().unwrap() = Some(result);
        self
    }

    pub fn with_related(self, related: Vec<RecommendedPlace>) -> Self {
        *self.related.lock().unwrap() = related;
        self
    }

    pub fn with_tastes(self, tastes: &[&str]) -> Self {
        *self.tastes.lock().unwrap() = tastes
            .iter()
            .map(|t| TasteSuggestion {
                id: t.to_lowercase(),
                text: t.to_string(),
            })
            .collect();
        self
    }

    pub fn failing_tastes(self, error: ProviderError) -> Self {
        *self.tastes_error.lock().unwrap() = Some(error);
        self
    }

    fn tastes(&self) -> Result<Vec<TasteSuggestion>, ProviderError> {
        match self.tastes_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(self.tastes.lock().unwrap().clone()),
        }
    }
}

#[async_trait]
impl PersonalizedSearch for MockPersonalized {
    async fn autocomplete(
        &self,
        _caption: &str,
        _limit: Option<u32>,
        _location: Coordinate,
    ) -> Result<Vec<RecommendedPlace>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn autocomplete_tastes(
        &self,
        _caption: &str,
        _limit: Option<u32>,
    ) -> Result<Vec<TasteSuggestion>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tastes()
    }

    async fn recommend(
        &self,
        _request: &RecommendedSearchRequest,
        _location: Option<Coordinate>,
    ) -> Result<Vec<RecommendedPlace>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.recommend_calls.fetch_add(1, Ordering::SeqCst);
        self.recommendations
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn taste_suggestions(&self, _page: u32) -> Result<Vec<TasteSuggestion>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tastes()
    }

    async fn related_places(&self, _place_id: &str) -> Result<Vec<RecommendedPlace>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.related_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.related.lock().unwrap().clone())
    }
}

/// Analytics sink remembering event names and error messages
#[derive(Default)]
pub struct RecordingAnalytics {
    pub events: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingAnalytics {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn track(&self, event: &str, _properties: Option<&Map<String, Value>>) {
        self.events.lock().unwrap().push(event.to_string());
    }

    fn track_error(&self, error: &(dyn std::error::Error + 'static), _context: Option<&str>) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}
