// Personalized recommendation and related-venue normalization

use serde_json::Value;

use super::value::ValueExt;
use super::{candidate_results, require_object, NormalizeResult};
use crate::models::RecommendedPlace;

/// Normalize a recommendation response (`group.results[]` of `{venue, photo, photos}`).
pub fn recommended_places(raw: &Value) -> NormalizeResult<Vec<RecommendedPlace>> {
    require_object(raw, "recommendations")?;

    Ok(candidate_results(raw)
        .iter()
        .filter_map(recommended_place)
        .collect())
}

/// Normalize a related-venues response (`related[].items[]`).
///
/// An empty object means the place has no related venues.
pub fn related_places(raw: &Value) -> NormalizeResult<Vec<RecommendedPlace>> {
    match raw.as_object() {
        Some(map) if map.is_empty() => return Ok(Vec::new()),
        _ => {
            require_object(raw, "related places")?;
        }
    }

    let items: Vec<&Value> = match raw.array_at("related") {
        Some(groups) => groups
            .iter()
            .filter_map(|group| group.array_at("items"))
            .flatten()
            .collect(),
        None => candidate_results(raw).iter().collect(),
    };

    Ok(items.into_iter().filter_map(recommended_place).collect())
}

fn recommended_place(item: &Value) -> Option<RecommendedPlace> {
    let venue = item.get("venue").unwrap_or(item);
    let id = venue.id_at("id").or_else(|| venue.id_at("fsq_id"))?;
    if id.is_empty() {
        return None;
    }

    let empty = Value::Null;
    let location = venue.get("location").unwrap_or(&empty);
    let text = |key: &str| location.str_at(key).unwrap_or_default().to_string();

    let categories = venue
        .array_at("categories")
        .map(|cats| {
            cats.iter()
                .filter_map(|c| c.str_at("name").map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let (photo, aspect_ratio) = match item.get("photo").and_then(sized_photo) {
        Some((url, width, height)) => {
            let ratio = if height > 0.0 { Some(width / height) } else { None };
            (Some(url), ratio)
        }
        None => (None, None),
    };

    let photos = item
        .path(&["photos", "groups"])
        .and_then(Value::as_array)
        .map(|groups| {
            groups
                .iter()
                .filter_map(|g| g.array_at("items"))
                .flatten()
                .filter_map(sized_photo)
                .map(|(url, _, _)| url)
                .collect()
        })
        .unwrap_or_default();

    Some(RecommendedPlace {
        id,
        name: venue.str_at("name").unwrap_or_default().to_string(),
        categories,
        latitude: location.f64_at("lat").unwrap_or_default(),
        longitude: location.f64_at("lng").unwrap_or_default(),
        neighborhood: text("neighborhood"),
        address: text("address"),
        country: text("country"),
        city: text("city"),
        state: text("state"),
        post_code: text("postalCode"),
        formatted_address: location.strings_at("formattedAddress").join(" "),
        photo,
        aspect_ratio,
        photos,
        tastes: venue.strings_at("tastes"),
    })
}

/// `(url, width, height)` for a prefix/suffix/width/height photo object
fn sized_photo(photo: &Value) -> Option<(String, f64, f64)> {
    let prefix = photo.str_at("prefix")?;
    let suffix = photo.str_at("suffix")?;
    let width = photo.f64_at("width")?;
    let height = photo.f64_at("height")?;
    let url = format!(
        "{}{}x{}{}",
        prefix,
        width.floor() as i64,
        height.floor() as i64,
        suffix
    );
    Some((url, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn venue(id: &str, name: &str) -> Value {
        json!({
            "venue": {
                "id": id,
                "name": name,
                "categories": [{"name": "Sushi Restaurant"}],
                "location": {
                    "address": "1 Spring St",
                    "city": "New York",
                    "state": "NY",
                    "postalCode": "10012",
                    "country": "US",
                    "neighborhood": "SoHo",
                    "formattedAddress": ["1 Spring St", "New York, NY 10012"],
                    "lat": 40.72,
                    "lng": -74.0
                }
            },
            "photo": {"prefix": "https://img/", "suffix": "/a.jpg", "width": 800, "height": 600},
            "photos": {"groups": [{"items": [
                {"prefix": "https://img/", "suffix": "/b.jpg", "width": 300.9, "height": 200},
                {"prefix": "https://img/", "suffix": "/c.jpg"}
            ]}]}
        })
    }

    #[test]
    fn test_recommended_venue_fields() {
        let raw = json!({"group": {"results": [venue("v1", "Omakase"), {"venue": {"name": "No Id"}}]}});
        let places = recommended_places(&raw).unwrap();

        assert_eq!(places.len(), 1);
        let p = &places[0];
        assert_eq!(p.id, "v1");
        assert_eq!(p.city, "New York");
        assert_eq!(p.formatted_address, "1 Spring St New York, NY 10012");
        assert_eq!(p.photo.as_deref(), Some("https://img/800x600/a.jpg"));
        assert!((p.aspect_ratio.unwrap() - 800.0 / 600.0).abs() < 1e-9);
        assert_eq!(p.photos, vec!["https://img/300x200/b.jpg".to_string()]);
    }

    #[test]
    fn test_recommendations_reject_empty_object() {
        assert!(recommended_places(&json!({})).is_err());
        assert!(recommended_places(&json!({"group": {"results": []}})).unwrap().is_empty());
    }

    #[test]
    fn test_related_flattens_groups() {
        let raw = json!({"related": [
            {"items": [venue("r1", "One")]},
            {"items": [venue("r2", "Two"), venue("r3", "Three")]}
        ]});
        let related = related_places(&raw).unwrap();
        let ids: Vec<_> = related.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);

        assert!(related_places(&json!({})).unwrap().is_empty());
        assert!(related_places(&json!([])).is_err());
    }
}
