// Photo and tip normalization
//
// Both endpoints answer with a top-level array. An empty object is a valid
// "nothing here" answer for these two and yields an empty list.

use serde_json::Value;
use std::collections::HashSet;

use super::value::ValueExt;
use super::{type_name, NormalizeError, NormalizeResult};
use crate::models::{Photo, Tip};

fn media_items<'a>(raw: &'a Value, endpoint: &str) -> NormalizeResult<&'a [Value]> {
    match raw {
        Value::Array(items) => Ok(items.as_slice()),
        Value::Object(map) if map.is_empty() => Ok(&[]),
        Value::Object(_) => {
            for key in ["results", "items"] {
                if let Some(items) = raw.array_at(key) {
                    return Ok(items.as_slice());
                }
            }
            Err(NormalizeError::InvalidRawResponseType(format!(
                "{}: object without a result array",
                endpoint
            )))
        }
        other => Err(NormalizeError::InvalidRawResponseType(format!(
            "{}: expected array, found {}",
            endpoint,
            type_name(other)
        ))),
    }
}

/// Normalize a photos response for `place_id`. Missing height defaults to 1.
pub fn photos(raw: &Value, place_id: &str) -> NormalizeResult<Vec<Photo>> {
    let items = media_items(raw, "photos")?;

    Ok(items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| Photo {
            id: item.id_at("id").unwrap_or_default(),
            place_id: place_id.to_string(),
            created_at: item.str_at("created_at").unwrap_or_default().to_string(),
            width: item.f64_at("width").unwrap_or(0.0),
            height: item.f64_at("height").unwrap_or(1.0),
            classifications: item.strings_at("classifications"),
            prefix: item.str_at("prefix").unwrap_or_default().to_string(),
            suffix: item.str_at("suffix").unwrap_or_default().to_string(),
        })
        .collect())
}

/// Normalize a tips response for `place_id`, keeping the first tip per id
pub fn tips(raw: &Value, place_id: &str) -> NormalizeResult<Vec<Tip>> {
    let items = media_items(raw, "tips")?;
    let mut seen = HashSet::new();

    let mut out = Vec::with_capacity(items.len());
    for item in items.iter().filter(|item| item.is_object()) {
        let id = item.id_at("id").unwrap_or_default();
        if !id.is_empty() && !seen.insert(id.clone()) {
            continue;
        }
        out.push(Tip {
            id,
            place_id: place_id.to_string(),
            created_at: item.str_at("created_at").unwrap_or_default().to_string(),
            text: item.str_at("text").unwrap_or_default().to_string(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_is_zero_results() {
        assert!(photos(&json!({}), "p1").unwrap().is_empty());
        assert!(tips(&json!({}), "p1").unwrap().is_empty());
    }

    #[test]
    fn test_unexpected_shapes_are_rejected() {
        assert!(photos(&json!("nope"), "p1").is_err());
        assert!(tips(&json!({"message": "boom"}), "p1").is_err());
    }

    #[test]
    fn test_photo_defaults() {
        let raw = json!([
            {"id": "ph1", "prefix": "https://img/", "suffix": "/x.jpg", "width": 640, "classifications": ["food"]},
            {"id": "ph2", "prefix": "https://img/", "suffix": "/y.jpg", "width": 300, "height": 150}
        ]);
        let found = photos(&raw, "place-9").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].height, 1.0);
        assert_eq!(found[0].place_id, "place-9");
        assert_eq!(found[0].classifications, vec!["food".to_string()]);
        assert_eq!(found[1].url(), "https://img/300x150/y.jpg");
    }

    #[test]
    fn test_tips_deduplicated_by_id() {
        let raw = json!([
            {"id": "t1", "text": "Get the omakase", "created_at": "2024-05-01T12:00:00Z"},
            {"id": "t1", "text": "Duplicate"},
            {"id": "t2", "text": "Cash only"},
            {"text": "Anonymous one"},
            {"text": "Anonymous two"}
        ]);
        let found = tips(&raw, "p1").unwrap();
        let texts: Vec<_> = found.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Get the omakase", "Cash only", "Anonymous one", "Anonymous two"]);
    }
}
