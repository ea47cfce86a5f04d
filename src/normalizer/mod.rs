//! Response normalizer
//!
//! Pure functions turning provider JSON into the canonical models in
//! `crate::models`. No I/O; malformed input yields skipped entries or a
//! `NormalizeError`, never a panic.

pub mod value;
pub mod places;
pub mod recommendations;
pub mod details;
pub mod media;
pub mod tastes;

use serde_json::{Map, Value};
use thiserror::Error;

pub use value::ValueExt;
pub use places::{autocomplete_summaries, location_results, place_summaries, place_summary};
pub use recommendations::{recommended_places, related_places};
pub use details::{place_details, DetailsParts};
pub use media::{photos, tips};
pub use tastes::taste_suggestions;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("invalid raw response type: {0}")]
    InvalidRawResponseType(String),
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Candidate result arrays in priority order
const RESULT_PATHS: [&[&str]; 4] = [
    &["group", "results"],
    &["group", "items"],
    &["results"],
    &["items"],
];

/// Top level must be a non-empty keyed object
pub(crate) fn require_object<'a>(raw: &'a Value, endpoint: &str) -> NormalizeResult<&'a Map<String, Value>> {
    match raw.as_object() {
        Some(map) if !map.is_empty() => Ok(map),
        Some(_) => Err(NormalizeError::InvalidRawResponseType(format!(
            "{}: empty object",
            endpoint
        ))),
        None => Err(NormalizeError::InvalidRawResponseType(format!(
            "{}: expected object, found {}",
            endpoint,
            type_name(raw)
        ))),
    }
}

/// First non-empty result array among the known envelopes
pub(crate) fn candidate_results(raw: &Value) -> &[Value] {
    RESULT_PATHS
        .iter()
        .filter_map(|path| raw.path(path).and_then(Value::as_array))
        .find(|items| !items.is_empty())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub(crate) fn type_name(raw: &Value) -> &'static str {
    match raw {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candidate_priority() {
        let raw = json!({
            "results": [{"n": "top"}],
            "group": {"results": [], "items": [{"n": "group-items"}]}
        });
        let found = candidate_results(&raw);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["n"], "group-items");
    }

    #[test]
    fn test_require_object_rejects_empty_and_arrays() {
        assert!(require_object(&json!({}), "search").is_err());
        assert!(require_object(&json!([1, 2]), "search").is_err());
        assert!(require_object(&json!("text"), "search").is_err());
        assert!(require_object(&json!({"results": []}), "search").is_ok());
    }
}
