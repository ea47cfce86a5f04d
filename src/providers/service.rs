//! Provider session contracts
//!
//! Defines the interface the search orchestrator uses for each place-data
//! backend, so either client can be replaced in tests.

use async_trait::async_trait;
use serde_json::Value;

use super::error::ProviderError;
use super::request::{PlaceDetailsRequest, PlaceSearchRequest, RecommendedSearchRequest};
use crate::models::{Coordinate, LocationResult, Photo, PlaceSummary, RecommendedPlace, TasteSuggestion, Tip};

/// Generic catalog search, authorized with a static service key
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search(
        &self,
        request: &PlaceSearchRequest,
        location: Option<Coordinate>,
    ) -> Result<Vec<PlaceSummary>, ProviderError>;

    /// Raw details payload for the requested field mask
    async fn details(&self, request: &PlaceDetailsRequest) -> Result<Value, ProviderError>;

    async fn photos(&self, place_id: &str) -> Result<Vec<Photo>, ProviderError>;

    async fn tips(&self, place_id: &str) -> Result<Vec<Tip>, ProviderError>;

    async fn autocomplete(
        &self,
        caption: &str,
        limit: Option<u32>,
        location: Option<Coordinate>,
    ) -> Result<Vec<PlaceSummary>, ProviderError>;

    /// Geo, address and place candidates for a destination caption
    async fn search_locations(
        &self,
        caption: &str,
        near: Option<Coordinate>,
    ) -> Result<Vec<LocationResult>, ProviderError>;

    /// Location candidates for a `"poi, near"` caption, merged with a place search
    async fn autocomplete_location_results(
        &self,
        caption: &str,
        location: Option<Coordinate>,
    ) -> Result<Vec<LocationResult>, ProviderError>;

    /// Drop the cached service key and its stored record
    async fn invalidate_session(&self) -> Result<(), ProviderError>;
}

/// Personalized recommendations, authorized with a managed-user bearer token
#[async_trait]
pub trait PersonalizedSearch: Send + Sync {
    async fn autocomplete(
        &self,
        caption: &str,
        limit: Option<u32>,
        location: Coordinate,
    ) -> Result<Vec<RecommendedPlace>, ProviderError>;

    async fn autocomplete_tastes(
        &self,
        caption: &str,
        limit: Option<u32>,
    ) -> Result<Vec<TasteSuggestion>, ProviderError>;

    async fn recommend(
        &self,
        request: &RecommendedSearchRequest,
        location: Option<Coordinate>,
    ) -> Result<Vec<RecommendedPlace>, ProviderError>;

    /// Onboarding taste suggestions; `page` is the provider offset
    async fn taste_suggestions(&self, page: u32) -> Result<Vec<TasteSuggestion>, ProviderError>;

    async fn related_places(&self, place_id: &str) -> Result<Vec<RecommendedPlace>, ProviderError>;
}
