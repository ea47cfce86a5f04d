//! Catalog search client
//!
//! Talks to the v3 places endpoints. The service key is resolved once per
//! process through the credential resolver and sent as the raw
//! `Authorization` header.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::error::ProviderError;
use super::request::{PlaceDetailsRequest, PlaceSearchRequest, QueryPairs};
use super::retry::SessionRetryGate;
use super::service::CatalogSearch;
use super::transport::{ApiRequest, HttpTransport};
use crate::config::DiscoveryConfig;
use crate::credentials::CredentialResolver;
use crate::models::{Coordinate, LocationResult, Photo, PlaceSummary, Tip};
use crate::normalizer;

const PLACE_SEARCH_PATH: &str = "v3/places/search";
const PLACE_DETAILS_PATH: &str = "v3/places";
const AUTOCOMPLETE_PATH: &str = "v3/autocomplete";
const MEDIA_LIMIT: u32 = 50;
const LOCATION_RESULT_LIMIT: u32 = 20;
/// Coordinates closer than this are the same location
const COORDINATE_TOLERANCE: f64 = 1e-6;

pub struct CatalogClient {
    config: Arc<DiscoveryConfig>,
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<CredentialResolver>,
    retry_gate: Arc<SessionRetryGate>,
}

impl CatalogClient {
    pub fn new(
        config: Arc<DiscoveryConfig>,
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<CredentialResolver>,
        retry_gate: Arc<SessionRetryGate>,
    ) -> Self {
        Self {
            config,
            transport,
            credentials,
            retry_gate,
        }
    }

    /// Fetch with one invalidate-and-retry on a rejected session
    async fn fetch(&self, path: &str, query: QueryPairs) -> Result<Value, ProviderError> {
        match self.fetch_once(path, query.clone()).await {
            Err(ProviderError::InvalidSession) => {
                let _permit = self.retry_gate.try_acquire()?;
                log::warn!("Catalog session rejected, retrying {} with a fresh key", path);
                self.invalidate_session().await?;
                self.fetch_once(path, query).await
            }
            result => result,
        }
    }

    async fn fetch_once(&self, path: &str, query: QueryPairs) -> Result<Value, ProviderError> {
        let api_key = self
            .credentials
            .resolve_service_key(&self.config.catalog_service)
            .await?;

        let mut pairs = vec![("v".to_string(), self.config.catalog_version.clone())];
        pairs.extend(query);

        let request = ApiRequest::get(self.config.endpoint(path), pairs, api_key);
        self.transport.send(request).await
    }

    fn require_place_id(place_id: &str) -> Result<(), ProviderError> {
        if place_id.trim().is_empty() {
            return Err(ProviderError::UnsupportedRequest("empty place id".to_string()));
        }
        Ok(())
    }

    /// Coordinate of the first place matching a free-text near-location
    async fn resolve_near(&self, near: &str) -> Result<Option<Coordinate>, ProviderError> {
        let request = PlaceSearchRequest {
            near_location: Some(near.to_string()),
            limit: 1,
            ..Default::default()
        };
        let hits = self.search(&request, None).await?;
        Ok(hits.into_iter().find(|p| p.has_coordinate()).map(|p| p.coordinate()))
    }
}

#[async_trait]
impl CatalogSearch for CatalogClient {
    async fn search(
        &self,
        request: &PlaceSearchRequest,
        location: Option<Coordinate>,
    ) -> Result<Vec<PlaceSummary>, ProviderError> {
        let query = request.query_pairs(location, self.config.near_location_radius);
        let raw = self.fetch(PLACE_SEARCH_PATH, query).await?;
        Ok(normalizer::place_summaries(&raw)?)
    }

    async fn details(&self, request: &PlaceDetailsRequest) -> Result<Value, ProviderError> {
        Self::require_place_id(&request.place_id)?;
        let path = format!("{}/{}", PLACE_DETAILS_PATH, request.place_id);
        let query = vec![("fields".to_string(), request.fields_param())];
        self.fetch(&path, query).await
    }

    async fn photos(&self, place_id: &str) -> Result<Vec<Photo>, ProviderError> {
        Self::require_place_id(place_id)?;
        let path = format!("{}/{}/photos", PLACE_DETAILS_PATH, place_id);
        let query = vec![
            ("limit".to_string(), MEDIA_LIMIT.to_string()),
            ("sort".to_string(), "newest".to_string()),
        ];
        let raw = self.fetch(&path, query).await?;
        Ok(normalizer::photos(&raw, place_id)?)
    }

    async fn tips(&self, place_id: &str) -> Result<Vec<Tip>, ProviderError> {
        Self::require_place_id(place_id)?;
        let path = format!("{}/{}/tips", PLACE_DETAILS_PATH, place_id);
        let query = vec![("limit".to_string(), MEDIA_LIMIT.to_string())];
        let raw = self.fetch(&path, query).await?;
        Ok(normalizer::tips(&raw, place_id)?)
    }

    async fn autocomplete(
        &self,
        caption: &str,
        limit: Option<u32>,
        location: Option<Coordinate>,
    ) -> Result<Vec<PlaceSummary>, ProviderError> {
        let mut query = vec![("query".to_string(), caption.trim().to_string())];
        if let Some(location) = location {
            query.push(("ll".to_string(), location.ll()));
            query.push(("radius".to_string(), self.config.autocomplete_radius.to_string()));
        }
        query.push((
            "limit".to_string(),
            limit.unwrap_or(self.config.default_limit).to_string(),
        ));
        query.push(("types".to_string(), "place".to_string()));

        let raw = self.fetch(AUTOCOMPLETE_PATH, query).await?;
        Ok(normalizer::autocomplete_summaries(&raw)?)
    }

    async fn search_locations(
        &self,
        caption: &str,
        near: Option<Coordinate>,
    ) -> Result<Vec<LocationResult>, ProviderError> {
        let mut query = vec![
            ("query".to_string(), caption.trim().to_string()),
            ("types".to_string(), "geo,address,place".to_string()),
            ("limit".to_string(), LOCATION_RESULT_LIMIT.to_string()),
        ];
        if let Some(near) = near {
            query.push(("ll".to_string(), near.ll()));
            query.push(("radius".to_string(), self.config.location_search_radius.to_string()));
        }

        let raw = self.fetch(AUTOCOMPLETE_PATH, query).await?;
        Ok(normalizer::location_results(&raw)?)
    }

    async fn autocomplete_location_results(
        &self,
        caption: &str,
        location: Option<Coordinate>,
    ) -> Result<Vec<LocationResult>, ProviderError> {
        let (poi, near) = match caption.split_once(',') {
            Some((poi, near)) => (poi.trim(), Some(near.trim()).filter(|n| !n.is_empty())),
            None => (caption.trim(), None),
        };

        let bias = match near {
            Some(near) => self.resolve_near(near).await?.or(location),
            None => location,
        };

        let mut results = self.search_locations(poi, bias).await?;

        let request = PlaceSearchRequest {
            query: poi.to_string(),
            limit: LOCATION_RESULT_LIMIT,
            ..Default::default()
        };
        let places = self.search(&request, bias).await?;

        for place in places.into_iter().filter(PlaceSummary::has_coordinate) {
            let coordinate = place.coordinate();
            let duplicate = results.iter().any(|r| {
                r.name == place.name
                    && r.coordinate.map_or(false, |c| {
                        (c.latitude - coordinate.latitude).abs() < COORDINATE_TOLERANCE
                            && (c.longitude - coordinate.longitude).abs() < COORDINATE_TOLERANCE
                    })
            });
            if !duplicate {
                let formatted = Some(place.formatted_address.clone()).filter(|f| !f.is_empty());
                results.push(LocationResult::new(place.name, Some(coordinate)).with_formatted_address(formatted));
            }
        }

        Ok(results)
    }

    async fn invalidate_session(&self) -> Result<(), ProviderError> {
        self.credentials
            .invalidate_service_key(&self.config.catalog_service)
            .await?;
        Ok(())
    }
}

/// Centre of the bounding box around `places`
pub fn center_of(places: &[PlaceSummary]) -> Result<Coordinate, ProviderError> {
    let first = places.first().ok_or(ProviderError::NoPlaceLocationsFound)?;

    let (mut min_lat, mut max_lat) = (first.latitude, first.latitude);
    let (mut min_lon, mut max_lon) = (first.longitude, first.longitude);
    for place in &places[1..] {
        min_lat = min_lat.min(place.latitude);
        max_lat = max_lat.max(place.latitude);
        min_lon = min_lon.min(place.longitude);
        max_lon = max_lon.max(place.longitude);
    }

    Ok(Coordinate::new(
        (max_lat - min_lat) / 2.0 + min_lat,
        (max_lon - min_lon) / 2.0 + min_lon,
    ))
}
