//! Provider error taxonomy and in-band error classification

use serde_json::Value;
use std::fmt;

use crate::credentials::CredentialError;
use crate::normalizer::{NormalizeError, ValueExt};

/// Prefix of the provider's in-band outage message
const SERVER_TROUBLE_PREFIX: &str = "Foursquare servers";
/// In-band message for a rejected session token
const INVALID_TOKEN_MESSAGE: &str = "Invalid request token.";

/// Error types for provider calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// No key stored for the named service
    ServiceNotFound(String),
    NoUserFound,
    /// No usable personalized token; callers fall back to the catalog client
    NoTokenFound,
    /// Provider-side outage signalled in the response body
    ServerErrorMessage(String),
    /// Session token rejected; triggers one invalidate-and-retry
    InvalidSession,
    /// Malformed local request
    UnsupportedRequest(String),
    NoPlaceLocationsFound,
    NoVenuesFound,
    NoTasteFound,
    /// A session retry was already in flight
    RetryTimeout,
    Cancelled,
    /// Network failure, timeout or unexpected HTTP status
    Transport(String),
    /// Payload could not be normalized
    Parse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::ServiceNotFound(service) => write!(f, "Service not found: {}", service),
            ProviderError::NoUserFound => write!(f, "No managed user found"),
            ProviderError::NoTokenFound => write!(f, "No access token found"),
            ProviderError::ServerErrorMessage(msg) => write!(f, "Provider server error: {}", msg),
            ProviderError::InvalidSession => write!(f, "Invalid session"),
            ProviderError::UnsupportedRequest(msg) => write!(f, "Unsupported request: {}", msg),
            ProviderError::NoPlaceLocationsFound => write!(f, "No place locations found"),
            ProviderError::NoVenuesFound => write!(f, "No venues found"),
            ProviderError::NoTasteFound => write!(f, "No tastes found"),
            ProviderError::RetryTimeout => write!(f, "Session retry already in progress"),
            ProviderError::Cancelled => write!(f, "Request cancelled"),
            ProviderError::Transport(msg) => write!(f, "Request failed: {}", msg),
            ProviderError::Parse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Legitimate empty-result states, as opposed to failures
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            ProviderError::NoPlaceLocationsFound | ProviderError::NoVenuesFound | ProviderError::NoTasteFound
        )
    }
}

impl From<CredentialError> for ProviderError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::ServiceNotFound(service) => ProviderError::ServiceNotFound(service),
            CredentialError::NoUserFound => ProviderError::NoUserFound,
            CredentialError::NoTokenFound => ProviderError::NoTokenFound,
            CredentialError::Store(msg) => ProviderError::Transport(msg),
        }
    }
}

impl From<NormalizeError> for ProviderError {
    fn from(e: NormalizeError) -> Self {
        ProviderError::Parse(e.to_string())
    }
}

/// Inspect a decoded body for in-band errors
pub fn classify_body(body: &Value) -> Result<(), ProviderError> {
    if let Some(message) = body.str_at("message") {
        if message.starts_with(SERVER_TROUBLE_PREFIX) {
            return Err(ProviderError::ServerErrorMessage(message.to_string()));
        }
        if message == INVALID_TOKEN_MESSAGE {
            return Err(ProviderError::InvalidSession);
        }
    }

    if let Some(meta) = body.get("meta") {
        match meta.i64_at("code") {
            Some(500) => {
                let detail = meta.str_at("errorDetail").unwrap_or("meta code 500");
                return Err(ProviderError::ServerErrorMessage(detail.to_string()));
            }
            Some(401) if meta.str_at("errorType") == Some("invalid_auth") => {
                return Err(ProviderError::InvalidSession);
            }
            _ => {}
        }
    }

    Ok(())
}

/// Decode a response body. Undecodable bodies count as server errors;
/// non-success statuses without an in-band message are transport errors.
pub fn decode_body(status: u16, body: &[u8]) -> Result<Value, ProviderError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        log::warn!("Undecodable provider response (status {}): {}", status, e);
        ProviderError::ServerErrorMessage(format!("undecodable response: {}", e))
    })?;

    classify_body(&value)?;

    if !(200..300).contains(&status) {
        if status >= 500 {
            return Err(ProviderError::ServerErrorMessage(format!("HTTP {}", status)));
        }
        return Err(ProviderError::Transport(format!("HTTP {}", status)));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_band_messages() {
        assert!(matches!(
            classify_body(&json!({"message": "Foursquare servers are experiencing problems."})),
            Err(ProviderError::ServerErrorMessage(_))
        ));
        assert_eq!(
            classify_body(&json!({"message": "Invalid request token."})),
            Err(ProviderError::InvalidSession)
        );
        assert!(matches!(
            classify_body(&json!({"meta": {"code": 500}, "response": {}})),
            Err(ProviderError::ServerErrorMessage(_))
        ));
        assert!(classify_body(&json!({"meta": {"code": 200}, "response": {}})).is_ok());
    }

    #[test]
    fn test_decode_body() {
        assert!(matches!(decode_body(200, b"<html>"), Err(ProviderError::ServerErrorMessage(_))));
        assert_eq!(
            decode_body(401, br#"{"message": "Invalid request token."}"#),
            Err(ProviderError::InvalidSession)
        );
        assert!(matches!(decode_body(404, br#"{"message": "Not found"}"#), Err(ProviderError::Transport(_))));
        assert_eq!(decode_body(200, br#"{"results": []}"#).unwrap(), json!({"results": []}));
    }
}
