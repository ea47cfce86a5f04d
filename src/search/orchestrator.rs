//! Search orchestrator
//!
//! Owns the intent history and every published result list. Each search turn
//! is classified, recorded, dispatched to the catalog or personalized
//! provider, enriched, ranked and then published in one step. A failed turn
//! leaves the published lists untouched.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::enrichment::{self, merge_details};
use super::locations::{append_locations, append_placemarks, merged_location_results};
use super::ranking::{sort_alphabetically, sort_by_distance, sort_by_rating};
use super::results::{section_results, CategoryResult, SearchResult, SearchSnapshot};
use super::task_registry::{SearchTaskRegistry, USER_SEARCH_SCOPE};
use super::taxonomy::load_taxonomy;
use super::SearchError;
use crate::cache::{CacheError, CacheGateway};
use crate::collaborators::{AnalyticsSink, EntitlementSource, LocationProvider};
use crate::config::DiscoveryConfig;
use crate::database::{CachedUserRecord, RecordGroup};
use crate::intent::{
    classify, default_parameters, describe, search_request, Fulfillment, Intent, IntentHistory, IntentType,
    SearchFilters, SearchSection,
};
use crate::models::{Coordinate, LocationResult, PlaceDetails, PlaceSummary, RecommendedPlace};
use crate::providers::{CatalogSearch, PersonalizedSearch, RecommendedSearchRequest};

const PLACES_LIST: &str = "Places";
const RECOMMENDED_LIST: &str = "Recommended";
const RELATED_LIST: &str = "Related";
const TASTE_LIST: &str = "Taste";

struct SearchState {
    history: IntentHistory,
    published: SearchSnapshot,
    current_location: LocationResult,
    fetched_locations: Vec<LocationResult>,
    last_taste_page: Option<u32>,
}

/// What a dispatched turn produced
struct Dispatched {
    fulfillment: Fulfillment,
    tastes: Option<Vec<CategoryResult>>,
}

/// Keeps the refreshing flag raised while alive
struct RefreshGuard<'a>(&'a AtomicUsize);

impl<'a> RefreshGuard<'a> {
    fn new(active: &'a AtomicUsize) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(active)
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct SearchOrchestrator {
    config: Arc<DiscoveryConfig>,
    catalog: Arc<dyn CatalogSearch>,
    personalized: Arc<dyn PersonalizedSearch>,
    cache: Arc<CacheGateway>,
    location: Arc<dyn LocationProvider>,
    entitlement: Arc<dyn EntitlementSource>,
    analytics: Arc<dyn AnalyticsSink>,
    state: RwLock<SearchState>,
    tasks: SearchTaskRegistry,
    refreshing: AtomicUsize,
}

impl SearchOrchestrator {
    pub fn new(
        config: Arc<DiscoveryConfig>,
        catalog: Arc<dyn CatalogSearch>,
        personalized: Arc<dyn PersonalizedSearch>,
        cache: Arc<CacheGateway>,
        location: Arc<dyn LocationProvider>,
        entitlement: Arc<dyn EntitlementSource>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        let state = SearchState {
            history: IntentHistory::new(),
            published: SearchSnapshot {
                sections: section_results(),
                ..Default::default()
            },
            current_location: LocationResult::current(location.current_location()),
            fetched_locations: Vec::new(),
            last_taste_page: None,
        };

        Self {
            config,
            catalog,
            personalized,
            cache,
            location,
            entitlement,
            analytics,
            state: RwLock::new(state),
            tasks: SearchTaskRegistry::new(),
            refreshing: AtomicUsize::new(0),
        }
    }

    // ===== Searching =====

    /// Run one search turn to completion
    pub async fn search(
        &self,
        caption: &str,
        kind: Option<IntentType>,
        filters: &SearchFilters,
    ) -> Result<Uuid, SearchError> {
        self.run_turn(caption, kind, filters, None, &CancellationToken::new())
            .await
    }

    /// Start a user search in the background, cancelling the previous one
    pub fn spawn_search(
        self: &Arc<Self>,
        caption: &str,
        kind: Option<IntentType>,
        filters: &SearchFilters,
    ) -> JoinHandle<Result<Uuid, SearchError>> {
        let (task_id, token) = self.tasks.supersede(USER_SEARCH_SCOPE);
        let this = Arc::clone(self);
        let caption = caption.to_string();
        let filters = filters.clone();

        tokio::spawn(async move {
            let result = this
                .run_cancellable(&caption, kind, &filters, None, &token)
                .await;
            this.tasks.remove_task(&task_id);
            result
        })
    }

    /// Open a published result: fetch its details, tips and photos and select it
    pub async fn select_place(&self, result_id: Uuid) -> Result<Uuid, SearchError> {
        let place = {
            let state = self.state.read().await;
            find_result(&state.published, result_id)
                .and_then(|r| r.place.clone())
                .ok_or_else(|| SearchError::UnknownResult(result_id.to_string()))?
        };

        let (task_id, token) = self.tasks.supersede(USER_SEARCH_SCOPE);
        let caption = place.name.clone();
        let result = self
            .run_cancellable(
                &caption,
                Some(IntentType::PlaceLookup),
                &SearchFilters::default(),
                Some(place),
                &token,
            )
            .await;
        self.tasks.remove_task(&task_id);
        result
    }

    async fn run_cancellable(
        &self,
        caption: &str,
        kind: Option<IntentType>,
        filters: &SearchFilters,
        selection: Option<PlaceSummary>,
        token: &CancellationToken,
    ) -> Result<Uuid, SearchError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                log::debug!("Search '{}' superseded", caption);
                Err(SearchError::Cancelled)
            }
            result = self.run_turn(caption, kind, filters, selection, token) => result,
        }
    }

    async fn run_turn(
        &self,
        caption: &str,
        kind: Option<IntentType>,
        filters: &SearchFilters,
        selection: Option<PlaceSummary>,
        token: &CancellationToken,
    ) -> Result<Uuid, SearchError> {
        let start = Instant::now();
        let _refreshing = RefreshGuard::new(&self.refreshing);

        let (intent_id, intent) = self.record_intent(caption, kind, filters, selection).await?;
        self.analytics.track(intent.kind().event_name(), None);

        let dispatched = match self.dispatch(&intent).await {
            Ok(dispatched) => dispatched,
            Err(e) => {
                self.track_error(&e, intent.kind().event_name());
                return Err(e);
            }
        };

        perf_debug!(
            "Dispatched {:?} turn {} after {:?}",
            intent.kind(),
            intent_id,
            start.elapsed()
        );

        self.publish(intent_id, &intent, dispatched, token).await?;
        perf_elapsed!(format!("search '{}'", caption), start);
        Ok(intent_id)
    }

    async fn record_intent(
        &self,
        caption: &str,
        kind: Option<IntentType>,
        filters: &SearchFilters,
        selection: Option<PlaceSummary>,
    ) -> Result<(Uuid, Intent), SearchError> {
        let mut state = self.state.write().await;
        let destination = self.destination_in(&mut *state);

        let explicit = kind.is_some();
        let kind = kind.unwrap_or_else(|| {
            let titles: Vec<String> = state.published.places.iter().map(|r| r.title.clone()).collect();
            classify(caption, &titles)
        });
        let parameters = default_parameters(caption, filters);

        let needs_location = matches!(
            kind,
            IntentType::GeneralSearch | IntentType::AutocompleteSearch
        ) || (kind == IntentType::PlaceLookup && selection.is_none());
        if needs_location && destination.coordinate.is_none() && !parameters.contains_key("near_location") {
            return Err(SearchError::MissingSelectedDestinationLocation);
        }

        let classification = describe(caption, kind, &parameters, explicit);
        perf_trace!("Classified '{}': {:?}", caption, classification);
        let mut intent = Intent::new(caption, kind, destination, parameters).with_classification(classification);
        if let Some(place) = selection {
            intent = intent.with_selected_place(place);
        }

        let id = state.history.record(intent);
        let recorded = state.history.get(id).cloned().ok_or(SearchError::MissingLastIntent)?;
        log::info!("Search turn {} ({:?}): '{}'", id, kind, caption);
        Ok((id, recorded))
    }

    async fn dispatch(&self, intent: &Intent) -> Result<Dispatched, SearchError> {
        let mut fulfillment = intent.fulfillment.clone();
        let request = search_request(intent.parameters());
        let location = intent.destination().coordinate;
        let mut tastes = None;

        match intent.kind() {
            IntentType::PlaceLookup => {
                if fulfillment.selected_place.is_none() {
                    let places = self.catalog.search(&request.to_catalog(), location).await?;
                    fulfillment.selected_place = places.first().cloned();
                    fulfillment.places = places;
                }
                self.detail_intent(&mut fulfillment).await;
            }
            IntentType::GeneralSearch => {
                self.general_search(&request, location, &mut fulfillment).await?;
            }
            IntentType::LocationOnly => {
                if let Some(near) = request.near_location.as_deref() {
                    let placemarks = self.location.look_up_location_name(near).await;
                    let mut state = self.state.write().await;
                    append_placemarks(&mut state.fetched_locations, &placemarks);
                }
                self.general_search(&request, location, &mut fulfillment).await?;
            }
            IntentType::AutocompleteSearch => {
                let places = self.autocomplete_places(intent.caption(), &request, location).await?;
                if fulfillment.places.is_empty() {
                    fulfillment.places = places;
                }
            }
            IntentType::AutocompleteTastes => {
                if self.entitlement.has_personalized_access() {
                    let suggestions = match self
                        .personalized
                        .autocomplete_tastes(intent.caption(), Some(request.limit))
                        .await
                    {
                        Err(e) if e.is_empty_result() => Vec::new(),
                        result => result?,
                    };
                    tastes = Some(
                        suggestions
                            .into_iter()
                            .map(|t| CategoryResult::new(t.text, TASTE_LIST))
                            .collect(),
                    );
                } else {
                    log::debug!("Taste autocomplete skipped without personalized access");
                }
            }
        }

        Ok(Dispatched { fulfillment, tastes })
    }

    /// Personalized recommendations when entitled, falling back to the catalog
    /// when they produce nothing usable
    async fn general_search(
        &self,
        request: &RecommendedSearchRequest,
        location: Option<Coordinate>,
        fulfillment: &mut Fulfillment,
    ) -> Result<(), SearchError> {
        if self.entitlement.has_personalized_access() {
            let recommended = match self.personalized.recommend(request, location).await {
                Ok(recommended) => recommended,
                Err(e) if e.is_empty_result() => Vec::new(),
                Err(e) => {
                    self.track_error(&SearchError::from(e), "recommend");
                    Vec::new()
                }
            };

            if !recommended.is_empty() {
                fulfillment.places = recommended.iter().map(RecommendedPlace::to_summary).collect();
                fulfillment.recommended = recommended;
                return Ok(());
            }
            log::info!("No personalized results for '{}', using catalog search", request.query);
        }

        let places = self.catalog.search(&request.to_catalog(), location).await?;
        fulfillment.recommended.clear();
        if fulfillment.places.is_empty() {
            fulfillment.places = places;
        }
        Ok(())
    }

    async fn autocomplete_places(
        &self,
        caption: &str,
        request: &RecommendedSearchRequest,
        location: Option<Coordinate>,
    ) -> Result<Vec<PlaceSummary>, SearchError> {
        if self.entitlement.has_personalized_access() {
            if let Some(coordinate) = location {
                let recommended = self
                    .personalized
                    .autocomplete(caption, Some(request.limit), coordinate)
                    .await?;
                return Ok(recommended.iter().map(RecommendedPlace::to_summary).collect());
            }
        }
        Ok(self.catalog.autocomplete(caption, Some(request.limit), location).await?)
    }

    /// Details for the selected place, with related places when entitled.
    ///
    /// Failures are tracked; the selected summary stays without details.
    async fn detail_intent(&self, fulfillment: &mut Fulfillment) {
        let Some(selected) = fulfillment.selected_place.clone() else {
            return;
        };
        let entitled = self.entitlement.has_personalized_access();
        let previous = self.previous_details().await;

        let related = async {
            if entitled && !selected.id.is_empty() {
                Some(self.personalized.related_places(&selected.id).await)
            } else {
                None
            }
        };
        let (enriched, related) = tokio::join!(
            enrichment::fetch_details(
                self.catalog.as_ref(),
                std::slice::from_ref(&selected),
                entitled,
                &previous
            ),
            related
        );

        for outcome in enriched {
            match outcome.details {
                Ok(details) => {
                    fulfillment.selected_details = Some(details.clone());
                    merge_details(&mut fulfillment.details, details);
                }
                Err(e) => self.track_error(&e, "place details"),
            }
        }

        match related {
            Some(Ok(related)) => fulfillment.related = related,
            Some(Err(e)) => self.track_error(&SearchError::from(e), "related places"),
            None => fulfillment.related.clear(),
        }
    }

    async fn previous_details(&self) -> Vec<PlaceDetails> {
        let state = self.state.read().await;
        state
            .history
            .iter()
            .flat_map(|intent| intent.fulfillment.details.iter().cloned())
            .collect()
    }

    /// Rank and publish a finished turn unless it was superseded
    async fn publish(
        &self,
        intent_id: Uuid,
        intent: &Intent,
        dispatched: Dispatched,
        token: &CancellationToken,
    ) -> Result<(), SearchError> {
        let Dispatched { fulfillment, tastes } = dispatched;
        let ratings = self.place_ratings().await;
        let section = search_request(intent.parameters()).section.unwrap_or_default();
        let destination = intent.destination().coordinate;

        let places = place_results(&fulfillment.places, &fulfillment.details, &ratings, section, destination);
        let recommended = recommended_results(&fulfillment.recommended, RECOMMENDED_LIST, &ratings, section, destination);
        let related = recommended_results(&fulfillment.related, RELATED_LIST, &ratings, section, destination);

        let mut state = self.state.write().await;
        if token.is_cancelled() {
            log::debug!("Dropping results of superseded turn {}", intent_id);
            return Err(SearchError::Cancelled);
        }

        if let Some(slot) = state.history.fulfillment_mut(intent_id) {
            *slot = fulfillment.clone();
        }

        let published = &mut state.published;
        match intent.kind() {
            IntentType::PlaceLookup => {
                if !places.is_empty() {
                    published.places = places;
                }
                if let Some(details) = &fulfillment.selected_details {
                    patch_details(&mut published.places, details);
                    patch_details(&mut published.recommended, details);
                }
                published.selected_place_id = fulfillment
                    .selected_place
                    .as_ref()
                    .map(|p| p.id.clone())
                    .filter(|id| !id.is_empty());
                published.related = related;
            }
            IntentType::AutocompleteTastes => {
                if let Some(tastes) = tastes {
                    published.tastes = tastes;
                }
            }
            _ => {
                published.places = places;
                published.recommended = recommended;
                published.related = Vec::new();
                published.selected_place_id = None;
            }
        }
        Ok(())
    }

    async fn place_ratings(&self) -> HashMap<String, f64> {
        self.cache
            .cached(RecordGroup::Place)
            .await
            .into_iter()
            .map(|record| (record.identity, record.rating))
            .collect()
    }

    /// Fetch details for one published result lacking them and patch every
    /// list entry for the same place
    pub async fn fetch_place_details_if_needed(&self, result_id: Uuid) -> Result<Option<PlaceDetails>, SearchError> {
        let place = {
            let state = self.state.read().await;
            let result = find_result(&state.published, result_id)
                .ok_or_else(|| SearchError::UnknownResult(result_id.to_string()))?;
            if result.details.is_some() {
                return Ok(result.details.clone());
            }
            result
                .place
                .clone()
                .ok_or_else(|| SearchError::UnknownResult(result_id.to_string()))?
        };

        let previous = self.previous_details().await;
        let entitled = self.entitlement.has_personalized_access();
        let enriched = enrichment::fetch_details(
            self.catalog.as_ref(),
            std::slice::from_ref(&place),
            entitled,
            &previous,
        )
        .await;

        let mut fetched = None;
        for outcome in enriched {
            match outcome.details {
                Ok(details) => fetched = Some(details),
                Err(e) => {
                    self.track_error(&e, "place details");
                    return Err(e);
                }
            }
        }

        if let Some(details) = &fetched {
            let mut state = self.state.write().await;
            patch_details(&mut state.published.places, details);
            patch_details(&mut state.published.recommended, details);
            if let Some(last) = state.history.last().map(Intent::id) {
                if let Some(fulfillment) = state.history.fulfillment_mut(last) {
                    merge_details(&mut fulfillment.details, details.clone());
                }
            }
        }
        Ok(fetched)
    }

    // ===== Tastes =====

    /// Append one page of onboarding taste suggestions
    pub async fn refresh_tastes(&self, page: u32) -> Result<usize, SearchError> {
        if !self.entitlement.has_personalized_access() {
            return Ok(0);
        }
        let suggestions = match self.personalized.taste_suggestions(page).await {
            Ok(suggestions) => suggestions,
            Err(e) if e.is_empty_result() => {
                log::debug!("No taste suggestions on page {}", page);
                return Ok(0);
            }
            Err(e) => {
                let e = SearchError::from(e);
                self.track_error(&e, "taste suggestions");
                return Err(e);
            }
        };

        let mut state = self.state.write().await;
        let mut added = 0;
        for suggestion in suggestions {
            if state.published.tastes.iter().any(|t| t.identity == suggestion.text) {
                continue;
            }
            state.published.tastes.push(CategoryResult::new(suggestion.text, TASTE_LIST));
            added += 1;
        }
        state.last_taste_page = Some(page);
        Ok(added)
    }

    pub async fn last_taste_page(&self) -> Option<u32> {
        self.state.read().await.last_taste_page
    }

    // ===== Locations =====

    /// Look up destination candidates for `caption` and remember them
    pub async fn autocomplete_locations(&self, caption: &str) -> Result<Vec<LocationResult>, SearchError> {
        let near = self.destination().await.coordinate;
        let (fetched, placemarks) = tokio::join!(
            self.catalog.autocomplete_location_results(caption, near),
            self.location.look_up_location_name(caption)
        );
        let fetched = fetched.map_err(|e| {
            let e = SearchError::from(e);
            self.track_error(&e, "location autocomplete");
            e
        })?;

        let mut state = self.state.write().await;
        append_locations(&mut state.fetched_locations, fetched.clone());
        append_placemarks(&mut state.fetched_locations, &placemarks);
        Ok(fetched)
    }

    /// Current location, saved locations, then fetched ones
    pub async fn location_results(&self) -> Vec<LocationResult> {
        let cached = self.cache.cached_locations().await;
        let mut state = self.state.write().await;
        self.rebind_current_location(&mut *state);
        merged_location_results(&state.current_location, &cached, &state.fetched_locations)
    }

    /// Select a destination by id from the location list
    pub async fn select_destination(&self, location_id: &str) -> Result<LocationResult, SearchError> {
        let location = self
            .location_results()
            .await
            .into_iter()
            .find(|l| l.id == location_id)
            .ok_or(SearchError::MissingSelectedDestinationLocation)?;
        self.set_destination(Some(location.clone())).await;
        Ok(location)
    }

    /// `None` returns to the current location
    pub async fn set_destination(&self, location: Option<LocationResult>) {
        let mut state = self.state.write().await;
        state.published.selected_destination = location.filter(|l| !l.is_current_location());
    }

    /// Destination of the next turn
    pub async fn destination(&self) -> LocationResult {
        let mut state = self.state.write().await;
        self.destination_in(&mut *state)
    }

    fn destination_in(&self, state: &mut SearchState) -> LocationResult {
        self.rebind_current_location(state);
        state
            .published
            .selected_destination
            .clone()
            .unwrap_or_else(|| state.current_location.clone())
    }

    /// The placeholder keeps its id while the device coordinate changes
    fn rebind_current_location(&self, state: &mut SearchState) {
        if let Some(coordinate) = self.location.current_location() {
            state.current_location.coordinate = Some(coordinate);
        }
    }

    // ===== Initial data =====

    /// Load the category taxonomy while refreshing the saved-record cache.
    ///
    /// The cache refresh is abandoned after the configured timeout; the
    /// taxonomy is published either way.
    pub async fn load_initial_data(&self) -> Result<(), SearchError> {
        let cache = Arc::clone(&self.cache);
        self.load_initial_data_with(async move {
            cache
                .refresh(|fraction| log::debug!("Cache refresh {:.0}%", fraction * 100.0))
                .await
        })
        .await
    }

    pub(crate) async fn load_initial_data_with<F>(&self, refresh: F) -> Result<(), SearchError>
    where
        F: Future<Output = Result<(), CacheError>>,
    {
        let limit = self.config.cache_refresh_timeout();
        let (categories, refreshed) = tokio::join!(
            self.categorical_results(),
            tokio::time::timeout(limit, refresh)
        );

        {
            let mut state = self.state.write().await;
            state.published.categories = categories;
            state.published.sections = section_results();
        }

        match refreshed {
            Ok(Ok(())) => {
                self.refresh_saved_results().await;
                Ok(())
            }
            Ok(Err(e)) => {
                let e = SearchError::from(e);
                self.track_error(&e, "cache refresh");
                Err(e)
            }
            Err(_) => {
                let e = SearchError::CacheRefreshTimeout(limit);
                self.track_error(&e, "cache refresh");
                Err(e)
            }
        }
    }

    async fn categorical_results(&self) -> Vec<CategoryResult> {
        let Some(path) = self.config.taxonomy_path.clone() else {
            return Vec::new();
        };
        match tokio::task::spawn_blocking(move || load_taxonomy(&path)).await {
            Ok(Ok(categories)) => {
                log::info!("Loaded {} taxonomy categories", categories.len());
                categories
            }
            Ok(Err(e)) => {
                log::error!("Failed to load taxonomy: {:#}", e);
                Vec::new()
            }
            Err(e) => {
                log::error!("Taxonomy task failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Re-derive the saved category, taste and place lists from the cache mirror
    pub async fn refresh_saved_results(&self) {
        let categories = self.cache.sorted_results(RecordGroup::Category).await;
        let tastes = self.cache.sorted_results(RecordGroup::Taste).await;
        let places = self.cache.sorted_results(RecordGroup::Place).await;

        let mut state = self.state.write().await;
        state.published.saved_categories = categories.iter().map(saved_result).collect();
        state.published.saved_tastes = tastes.iter().map(saved_result).collect();
        state.published.saved_places = places.iter().map(saved_result).collect();
    }

    // ===== Reading =====

    pub async fn snapshot(&self) -> SearchSnapshot {
        let mut snapshot = self.state.read().await.published.clone();
        snapshot.locations = self.location_results().await;
        snapshot.is_refreshing = self.is_refreshing();
        snapshot
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst) > 0
    }

    pub async fn last_intent(&self) -> Result<Intent, SearchError> {
        self.state
            .read()
            .await
            .history
            .last()
            .cloned()
            .ok_or(SearchError::MissingLastIntent)
    }

    pub async fn history_len(&self) -> usize {
        self.state.read().await.history.len()
    }

    /// Cancel in-flight searches and forget every turn
    pub async fn reset(&self) {
        self.tasks.cancel_all();
        let mut state = self.state.write().await;
        state.history.clear();
        state.published.places.clear();
        state.published.recommended.clear();
        state.published.related.clear();
        state.published.selected_place_id = None;
    }

    fn track_error(&self, error: &SearchError, context: &str) {
        log::warn!("{} failed: {}", context, error);
        self.analytics.track_error(error, Some(context));
    }
}

fn find_result(published: &SearchSnapshot, result_id: Uuid) -> Option<&SearchResult> {
    published
        .places
        .iter()
        .chain(published.recommended.iter())
        .chain(published.related.iter())
        .find(|r| r.id == result_id)
}

fn patch_details(results: &mut [SearchResult], details: &PlaceDetails) {
    for result in results.iter_mut() {
        if result.details.is_none() && result.place_id() == Some(details.id()) {
            result.details = Some(details.clone());
        }
    }
}

fn place_results(
    places: &[PlaceSummary],
    details: &[PlaceDetails],
    ratings: &HashMap<String, f64>,
    section: SearchSection,
    destination: Option<Coordinate>,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = places
        .iter()
        .enumerate()
        .map(|(index, place)| {
            let mut result = SearchResult::from_place(index, place.clone(), PLACES_LIST, section);
            result.rating = ratings.get(&place.id).copied().unwrap_or(1.0);
            result.details = details.iter().find(|d| d.id() == place.id).cloned();
            result
        })
        .collect();

    sort_alphabetically(&mut results);
    if let Some(destination) = destination {
        sort_by_distance(&mut results, destination);
    }
    results
}

fn recommended_results(
    recommended: &[RecommendedPlace],
    list: &str,
    ratings: &HashMap<String, f64>,
    section: SearchSection,
    destination: Option<Coordinate>,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = recommended
        .iter()
        .enumerate()
        .map(|(index, place)| {
            let mut result = SearchResult::from_recommended(index, place.clone(), list, section);
            result.rating = ratings.get(&place.id).copied().unwrap_or(1.0);
            result
        })
        .collect();

    sort_by_rating(&mut results);
    if let Some(destination) = destination {
        sort_by_distance(&mut results, destination);
    }
    results
}

fn saved_result(record: &CachedUserRecord) -> CategoryResult {
    CategoryResult {
        id: Uuid::new_v4(),
        identity: record.identity.clone(),
        title: record.title.clone(),
        list: record.list.clone(),
        section: SearchSection::from_label(&record.section).unwrap_or_default(),
        rating: record.rating,
        children: Vec::new(),
    }
}
