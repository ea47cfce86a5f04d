// Category taxonomy - groups the bundled category file by parent label

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::results::{CategoryEntry, CategoryResult};
use crate::normalizer::ValueExt;

/// Root label shared by every category; never shown as a parent
const ROOT_LABEL: &str = "Foursquare Places";

pub const CATEGORY_LIST: &str = "Category";

/// Read and organize a taxonomy file shaped `{code: {"full_label": [parent, .., label]}}`
pub fn load_taxonomy(path: &Path) -> Result<Vec<CategoryResult>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read taxonomy file {}", path.display()))?;
    let raw: Value = serde_json::from_str(&contents).context("Failed to parse taxonomy JSON")?;
    Ok(organize(&raw))
}

/// Parents sorted by label, each with its children sorted by label
pub fn organize(raw: &Value) -> Vec<CategoryResult> {
    let Some(entries) = raw.as_object() else {
        return Vec::new();
    };

    let mut grouped: BTreeMap<String, Vec<CategoryEntry>> = BTreeMap::new();
    for (code, entry) in entries {
        let labels = entry.strings_at("full_label");
        let (Some(parent), Some(label)) = (labels.first(), labels.last()) else {
            continue;
        };
        if parent == ROOT_LABEL {
            continue;
        }
        grouped.entry(parent.clone()).or_default().push(CategoryEntry {
            code: code.clone(),
            label: label.clone(),
        });
    }

    grouped
        .into_iter()
        .map(|(parent, mut children)| {
            children.sort_by(|a, b| a.label.cmp(&b.label));
            CategoryResult::new(parent, CATEGORY_LIST).with_children(children)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_groups_by_parent() {
        let raw = json!({
            "13065": {"full_label": ["Dining and Drinking", "Restaurant"]},
            "13003": {"full_label": ["Dining and Drinking", "Bar"]},
            "10000": {"full_label": ["Arts and Entertainment"]},
            "99999": {"full_label": ["Foursquare Places", "Internal"]},
            "bad": {"label": "missing"}
        });

        let categories = organize(&raw);
        let parents: Vec<_> = categories.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(parents, vec!["Arts and Entertainment", "Dining and Drinking"]);

        let dining = &categories[1];
        let labels: Vec<_> = dining.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Bar", "Restaurant"]);
        assert_eq!(dining.list, CATEGORY_LIST);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        assert!(load_taxonomy(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("taxonomy.json");
        std::fs::write(&path, r#"{"1": {"full_label": ["Travel", "Hotel"]}}"#).unwrap();

        let categories = load_taxonomy(&path).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].children[0].code, "1");
    }
}
