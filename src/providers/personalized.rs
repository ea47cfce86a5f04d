//! Personalized recommendations client
//!
//! Talks to the v2 endpoints with the managed user's bearer token. A rejected
//! token resets the cached session and retries once.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ProviderError;
use super::request::{QueryPairs, RecommendedSearchRequest};
use super::retry::SessionRetryGate;
use super::service::PersonalizedSearch;
use super::transport::{ApiRequest, HttpTransport};
use crate::config::DiscoveryConfig;
use crate::credentials::CredentialResolver;
use crate::models::{Coordinate, RecommendedPlace, TasteSuggestion};
use crate::normalizer;

const AUTOCOMPLETE_PATH: &str = "v2/search/autocomplete";
const RECOMMENDATIONS_PATH: &str = "v2/search/recommendations";
const TASTE_AUTOCOMPLETE_PATH: &str = "v2/tastes/autocomplete";
const TASTE_SUGGESTIONS_PATH: &str = "v2/tastes/suggestions";
const VENUES_PATH: &str = "v2/venues";
const AUTOCOMPLETE_RADIUS: u32 = 2000;
const AUTOCOMPLETE_NEAR_RADIUS: u32 = 100_000;
const TASTE_PAGE_SIZE: u32 = 50;

pub struct PersonalizedClient {
    config: Arc<DiscoveryConfig>,
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<CredentialResolver>,
    retry_gate: Arc<SessionRetryGate>,
}

impl PersonalizedClient {
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

    async fn fetch(&self, path: &str, query: QueryPairs) -> Result<Option<Value>, ProviderError> {
        match self.fetch_once(path, query.clone()).await {
            Err(ProviderError::InvalidSession) => {
                let _permit = self.retry_gate.try_acquire()?;
                log::warn!("Personalized session rejected, retrying {}", path);
                self.credentials.reset_user_session().await;
                self.fetch_once(path, query).await
            }
            result => result,
        }
    }

    /// Sends one request and unwraps the `response` envelope.
    ///
    /// `None` when the body or its envelope is not an object.
    async fn fetch_once(&self, path: &str, query: QueryPairs) -> Result<Option<Value>, ProviderError> {
        let token = self.credentials.access_token().await;
        if token.is_empty() {
            return Err(ProviderError::NoTokenFound);
        }

        let mut pairs = vec![("v".to_string(), self.config.personalized_version.clone())];
        pairs.extend(query);

        let request = ApiRequest::get(self.config.endpoint(path), pairs, format!("Bearer {}", token))
            .with_timeout(self.config.personalized_timeout());
        let body = self.transport.send(request).await?;

        Ok(match body {
            Value::Object(mut map) => map.remove("response").filter(Value::is_object),
            _ => None,
        })
    }
}

/// An absent envelope reads as an empty object
fn or_empty(raw: Option<Value>) -> Value {
    raw.unwrap_or_else(|| json!({}))
}

#[async_trait]
impl PersonalizedSearch for PersonalizedClient {
    async fn autocomplete(
        &self,
        caption: &str,
        limit: Option<u32>,
        location: Coordinate,
    ) -> Result<Vec<RecommendedPlace>, ProviderError> {
        let caption = caption.trim();
        let radius = if caption.to_lowercase().contains("near") {
            AUTOCOMPLETE_NEAR_RADIUS
        } else {
            AUTOCOMPLETE_RADIUS
        };

        let query = vec![
            ("query".to_string(), caption.to_string()),
            ("ll".to_string(), location.ll()),
            ("radius".to_string(), radius.to_string()),
            (
                "limit".to_string(),
                limit.unwrap_or(self.config.default_limit).to_string(),
            ),
        ];

        let raw = or_empty(self.fetch(AUTOCOMPLETE_PATH, query).await?);
        Ok(normalizer::recommended_places(&raw)?)
    }

    async fn autocomplete_tastes(
        &self,
        caption: &str,
        limit: Option<u32>,
    ) -> Result<Vec<TasteSuggestion>, ProviderError> {
        let query = vec![
            ("query".to_string(), caption.trim().to_string()),
            (
                "limit".to_string(),
                limit.unwrap_or(self.config.default_limit).to_string(),
            ),
        ];
        let raw = self
            .fetch(TASTE_AUTOCOMPLETE_PATH, query)
            .await?
            .ok_or(ProviderError::NoTasteFound)?;
        Ok(normalizer::taste_suggestions(&raw)?)
    }

    async fn recommend(
        &self,
        request: &RecommendedSearchRequest,
        location: Option<Coordinate>,
    ) -> Result<Vec<RecommendedPlace>, ProviderError> {
        let query = request.query_pairs(location, self.config.near_location_radius);
        let raw = self
            .fetch(RECOMMENDATIONS_PATH, query)
            .await?
            .ok_or(ProviderError::NoVenuesFound)?;
        Ok(normalizer::recommended_places(&raw)?)
    }

    async fn taste_suggestions(&self, page: u32) -> Result<Vec<TasteSuggestion>, ProviderError> {
        let query = vec![
            ("intent".to_string(), "onboarding".to_string()),
            ("limit".to_string(), TASTE_PAGE_SIZE.to_string()),
            ("offset".to_string(), page.to_string()),
        ];
        let raw = self
            .fetch(TASTE_SUGGESTIONS_PATH, query)
            .await?
            .ok_or(ProviderError::NoTasteFound)?;
        Ok(normalizer::taste_suggestions(&raw)?)
    }

    async fn related_places(&self, place_id: &str) -> Result<Vec<RecommendedPlace>, ProviderError> {
        if place_id.trim().is_empty() {
            return Err(ProviderError::UnsupportedRequest("empty place id".to_string()));
        }
        let path = format!("{}/{}/related", VENUES_PATH, place_id);
        let raw = or_empty(self.fetch(&path, Vec::new()).await?);
        Ok(normalizer::related_places(&raw)?)
    }
}
