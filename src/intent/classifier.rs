// Heuristic intent classification and default request parameters

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::model::{Classification, IntentType};
use super::section::SearchSection;
use crate::providers::RecommendedSearchRequest;

static NEAR_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\bnear\b\s*(.*)$").expect("Invalid regex"));

const LOCATION_PHRASES: [&str; 3] = ["near ", "around ", "close to "];
const TASTE_PHRASES: [&str; 3] = ["category", "type of", "kinds of"];
const DEFAULT_RADIUS: u32 = 20_000;
const DEFAULT_LIMIT: u32 = 50;
const HEURISTIC_CONFIDENCE: f64 = 0.5;

/// User-selected search filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    /// Search radius in kilometres
    pub distance_km: Option<f64>,
    pub open_now: Option<bool>,
}

/// Pick an intent type for `caption`.
///
/// A caption equal to a known place title (case-insensitive) is a place lookup.
pub fn classify(caption: &str, known_place_titles: &[String]) -> IntentType {
    let trimmed = caption.trim();
    if known_place_titles
        .iter()
        .any(|title| title.eq_ignore_ascii_case(trimmed))
    {
        return IntentType::PlaceLookup;
    }

    let lower = trimmed.to_lowercase();
    if LOCATION_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return IntentType::LocationOnly;
    }
    if TASTE_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return IntentType::AutocompleteTastes;
    }
    IntentType::GeneralSearch
}

/// Request parameters derived from the caption and filters
pub fn default_parameters(caption: &str, filters: &SearchFilters) -> Map<String, Value> {
    let lower = caption.to_lowercase();
    let not_expensive = lower.contains("not expensive") || lower.contains("not that expensive");

    let radius = filters
        .distance_km
        .map(|km| (km * 1000.0).round() as u32)
        .unwrap_or(DEFAULT_RADIUS);

    let mut params = Map::new();
    params.insert("radius".into(), json!(radius));
    params.insert("sort".into(), json!("distance"));
    params.insert("limit".into(), json!(DEFAULT_LIMIT));

    if lower.contains("expensive") && !not_expensive {
        params.insert("min_price".into(), json!(3));
    }
    if lower.contains("cheap") {
        params.insert("max_price".into(), json!(2));
    } else if not_expensive {
        params.insert("max_price".into(), json!(3));
    }

    let open_now = filters.open_now.unwrap_or(false) || lower.contains("open now");
    if open_now {
        params.insert("open_now".into(), json!(true));
    }

    let (query, near) = split_near_clause(caption);
    let section = SearchSection::from_label(&query).unwrap_or_default();
    params.insert("section".into(), json!(section));
    if let Some(near) = near {
        params.insert("near_location".into(), json!(near));
    }
    params.insert("query".into(), json!(query));

    params
}

/// Summarize a turn's type and parameters.
///
/// `explicit` marks a type chosen by the caller rather than by `classify`.
pub fn describe(caption: &str, kind: IntentType, parameters: &Map<String, Value>, explicit: bool) -> Classification {
    let request = search_request(parameters);
    Classification {
        search_type: Some(format!("{:?}", kind)),
        categories: request
            .section
            .map(|section| vec![section.label().to_string()])
            .unwrap_or_default(),
        tastes: Vec::new(),
        price_range: Some((request.min_price, request.max_price)),
        place_name: (kind == IntentType::PlaceLookup).then(|| caption.trim().to_string()),
        location_phrase: request.near_location,
        confidence: if explicit { 1.0 } else { HEURISTIC_CONFIDENCE },
    }
}

/// Split `"tacos near Austin"` into `("tacos", Some("Austin"))`
pub fn split_near_clause(caption: &str) -> (String, Option<String>) {
    match NEAR_CLAUSE.captures(caption) {
        Some(caps) => {
            let start = caps.get(0).map_or(caption.len(), |m| m.start());
            let near = caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .filter(|n| !n.is_empty());
            (caption[..start].trim().to_string(), near)
        }
        None => (caption.trim().to_string(), None),
    }
}

/// Interpret stored intent parameters as a recommendation request
pub fn search_request(parameters: &Map<String, Value>) -> RecommendedSearchRequest {
    match serde_json::from_value(Value::Object(parameters.clone())) {
        Ok(request) => request,
        Err(e) => {
            log::warn!("Ignoring malformed intent parameters: {}", e);
            RecommendedSearchRequest::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_heuristics() {
        let known = vec!["Joe's Pizza".to_string()];
        assert_eq!(classify("joe's pizza", &known), IntentType::PlaceLookup);
        assert_eq!(classify("coffee near Union Square", &known), IntentType::LocationOnly);
        assert_eq!(classify("what kinds of food", &known), IntentType::AutocompleteTastes);
        assert_eq!(classify("ramen", &known), IntentType::GeneralSearch);
        assert_eq!(classify("nearby bars", &known), IntentType::GeneralSearch);
    }

    #[test]
    fn test_price_phrases() {
        let params = default_parameters("expensive steak", &SearchFilters::default());
        assert_eq!(params["min_price"], json!(3));
        assert!(params.get("max_price").is_none());

        let params = default_parameters("not that expensive steak", &SearchFilters::default());
        assert!(params.get("min_price").is_none());
        assert_eq!(params["max_price"], json!(3));

        let params = default_parameters("cheap eats", &SearchFilters::default());
        assert_eq!(params["max_price"], json!(2));
    }

    #[test]
    fn test_filters_and_near_clause() {
        let filters = SearchFilters { distance_km: Some(2.5), open_now: Some(true) };
        let params = default_parameters("tacos near East Austin", &filters);
        assert_eq!(params["radius"], json!(2500));
        assert_eq!(params["open_now"], json!(true));
        assert_eq!(params["query"], json!("tacos"));
        assert_eq!(params["near_location"], json!("East Austin"));
        assert_eq!(params["sort"], json!("distance"));
    }

    #[test]
    fn test_describe_turn() {
        let params = default_parameters("cheap coffee near SoHo", &SearchFilters::default());
        let classification = describe("cheap coffee near SoHo", IntentType::LocationOnly, &params, false);
        assert_eq!(classification.search_type.as_deref(), Some("LocationOnly"));
        assert_eq!(classification.price_range, Some((1, 2)));
        assert_eq!(classification.location_phrase.as_deref(), Some("SoHo"));
        assert_eq!(classification.place_name, None);
        assert_eq!(classification.confidence, 0.5);

        let params = default_parameters("Joe's Pizza", &SearchFilters::default());
        let classification = describe("Joe's Pizza ", IntentType::PlaceLookup, &params, true);
        assert_eq!(classification.place_name.as_deref(), Some("Joe's Pizza"));
        assert_eq!(classification.confidence, 1.0);
    }

    #[test]
    fn test_parameters_become_request() {
        let params = default_parameters("Coffee", &SearchFilters::default());
        let request = search_request(&params);
        assert_eq!(request.section, Some(SearchSection::Coffee));
        assert_eq!(request.radius, 20_000);
        assert_eq!(request.limit, 50);
        assert_eq!(request.min_price, 1);
    }
}
