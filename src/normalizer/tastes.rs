// Taste autocomplete and suggestion normalization

use serde_json::Value;

use super::value::ValueExt;
use super::{candidate_results, require_object, NormalizeResult};
use crate::models::TasteSuggestion;

/// Normalize a `tastes[]` payload of `{id, text}` entries.
/// Entries missing either field are skipped.
pub fn taste_suggestions(raw: &Value) -> NormalizeResult<Vec<TasteSuggestion>> {
    require_object(raw, "tastes")?;

    let items = match raw.array_at("tastes") {
        Some(items) => items.as_slice(),
        None => candidate_results(raw),
    };

    Ok(items
        .iter()
        .filter_map(|item| {
            let id = item.id_at("id")?;
            let text = item.str_at("text").or_else(|| item.str_at("name"))?;
            Some(TasteSuggestion {
                id,
                text: text.to_string(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_taste_entries() {
        let raw = json!({"tastes": [
            {"id": "t1", "text": "omakase"},
            {"id": 42, "text": "ramen"},
            {"text": "no id"}
        ]});
        let found = taste_suggestions(&raw).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].id, "42");
        assert!(taste_suggestions(&json!({})).is_err());
    }
}
