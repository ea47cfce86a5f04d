// Catalog search and autocomplete normalization

use serde_json::Value;

use super::value::ValueExt;
use super::{candidate_results, require_object, NormalizeResult};
use crate::models::{Coordinate, LocationResult, PlaceSummary};

/// Normalize a catalog search response. Entries without an id are dropped.
pub fn place_summaries(raw: &Value) -> NormalizeResult<Vec<PlaceSummary>> {
    require_object(raw, "place search")?;

    Ok(candidate_results(raw)
        .iter()
        .filter_map(place_summary)
        .filter(|summary| !summary.id.is_empty())
        .collect())
}

/// Parse a single place object. Accepts the catalog shape (`fsq_id`,
/// `geocodes.main`, snake_case location) and the venue shape (`id`,
/// `location.lat/lng`, camelCase location).
pub fn place_summary(item: &Value) -> Option<PlaceSummary> {
    if !item.is_object() {
        return None;
    }
    let item = item.get("place").or_else(|| item.get("venue")).unwrap_or(item);

    let id = item
        .id_at("fsq_id")
        .or_else(|| item.id_at("fsq_place_id"))
        .or_else(|| item.id_at("id"))
        .unwrap_or_default();
    let name = item.str_at("name").unwrap_or_default().to_string();

    let categories = item
        .array_at("categories")
        .map(|cats| {
            cats.iter()
                .filter_map(|c| c.str_at("name").map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let coordinate = geocode(item).unwrap_or_default();
    let empty = Value::Null;
    let location = item.get("location").unwrap_or(&empty);
    let text = |keys: &[&str]| -> String {
        keys.iter()
            .find_map(|k| location.str_at(k))
            .unwrap_or_default()
            .to_string()
    };

    let formatted_address = match location.get("formatted_address").or_else(|| location.get("formattedAddress")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(lines)) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    };

    let chains = item
        .array_at("chains")
        .map(|chains| {
            chains
                .iter()
                .filter_map(|c| c.id_at("id").or_else(|| c.str_at("name").map(str::to_string)))
                .collect()
        })
        .unwrap_or_default();

    let related_ids = |key: &str| -> Vec<String> {
        item.path(&["related_places", key])
            .and_then(Value::as_array)
            .map(|rel| {
                rel.iter()
                    .filter_map(|r| r.id_at("fsq_id").or_else(|| r.id_at("id")))
                    .collect()
            })
            .unwrap_or_default()
    };
    let parent_ids = match item.path(&["related_places", "parent"]) {
        Some(parent) if parent.is_object() => parent.id_at("fsq_id").into_iter().collect(),
        _ => related_ids("parents"),
    };

    Some(PlaceSummary {
        id,
        name,
        categories,
        latitude: coordinate.latitude,
        longitude: coordinate.longitude,
        address: text(&["address"]),
        address_extended: text(&["address_extended", "crossStreet"]),
        locality: text(&["locality", "city"]),
        region: text(&["region", "state"]),
        post_code: text(&["postcode", "postalCode"]),
        country: text(&["country"]),
        formatted_address,
        neighborhood: text(&["dma", "neighborhood"]),
        chains,
        link: item.str_at("link").unwrap_or_default().to_string(),
        child_ids: related_ids("children"),
        parent_ids,
    })
}

/// Coordinate from `geocodes.main`, `geocodes.roof`, top-level lat/lng, or `location.lat/lng`
fn geocode(item: &Value) -> Option<Coordinate> {
    let from = |v: &Value, lat: &str, lon: &str| -> Option<Coordinate> {
        Some(Coordinate::new(v.f64_at(lat)?, v.f64_at(lon)?))
    };
    item.path(&["geocodes", "main"])
        .and_then(|g| from(g, "latitude", "longitude"))
        .or_else(|| item.path(&["geocodes", "roof"]).and_then(|g| from(g, "latitude", "longitude")))
        .or_else(|| from(item, "latitude", "longitude"))
        .or_else(|| item.get("location").and_then(|l| from(l, "lat", "lng")))
}

fn center(item: &Value) -> Option<Coordinate> {
    let c = item.get("center")?;
    Some(Coordinate::new(c.f64_at("latitude")?, c.f64_at("longitude")?))
}

/// Suggestion kinds carried by autocomplete responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SuggestionKind {
    Place,
    Geo,
    Query,
}

fn suggestion_kind(item: &Value) -> Option<SuggestionKind> {
    match item.str_at("type") {
        Some("place") => return Some(SuggestionKind::Place),
        Some("geo") | Some("address") => return Some(SuggestionKind::Geo),
        Some("query") | Some("search") => return Some(SuggestionKind::Query),
        _ => {}
    }
    if item.get("place").is_some() {
        Some(SuggestionKind::Place)
    } else if item.get("geo").is_some() || item.get("address").is_some() {
        Some(SuggestionKind::Geo)
    } else if item.get("structured_format").is_some() {
        Some(SuggestionKind::Query)
    } else {
        None
    }
}

/// Display text from `text` (string or `{primary}`), `structured_format.main_text`, or `name`
fn suggestion_text(item: &Value) -> Option<String> {
    let text = match item.get("text") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(obj @ Value::Object(_)) => obj.str_at("primary").map(str::to_string),
        _ => None,
    };
    text.or_else(|| item.path(&["structured_format", "main_text"]).and_then(Value::as_str).map(str::to_string))
        .or_else(|| item.str_at("name").map(str::to_string))
        .filter(|s| !s.trim().is_empty())
}

/// Normalize an autocomplete response into minimal summaries.
///
/// Place suggestions carry an id; geo suggestions carry a name and
/// coordinates; query suggestions carry only a name.
pub fn autocomplete_summaries(raw: &Value) -> NormalizeResult<Vec<PlaceSummary>> {
    require_object(raw, "autocomplete")?;

    let mut out = Vec::new();
    for item in candidate_results(raw) {
        match suggestion_kind(item) {
            Some(SuggestionKind::Place) => {
                if let Some(mut summary) = place_summary(item) {
                    if summary.name.is_empty() {
                        summary.name = suggestion_text(item).unwrap_or_default();
                    }
                    if !summary.name.is_empty() {
                        out.push(summary);
                    }
                }
            }
            Some(SuggestionKind::Geo) => {
                let geo = item.get("geo").or_else(|| item.get("address")).unwrap_or(item);
                let name = suggestion_text(item).or_else(|| geo.str_at("name").map(str::to_string));
                let coordinate = center(geo).or_else(|| center(item)).or_else(|| geocode(geo)).or_else(|| geocode(item));
                if let (Some(name), Some(coordinate)) = (name, coordinate) {
                    out.push(PlaceSummary {
                        name,
                        latitude: coordinate.latitude,
                        longitude: coordinate.longitude,
                        formatted_address: geo.str_at("formatted_address").unwrap_or_default().to_string(),
                        ..Default::default()
                    });
                }
            }
            Some(SuggestionKind::Query) => {
                if let Some(name) = suggestion_text(item) {
                    out.push(PlaceSummary { name, ..Default::default() });
                }
            }
            None => log::debug!("Skipping autocomplete entry with unknown kind"),
        }
    }
    Ok(out)
}

/// Location candidates from a `types=geo,address,place` autocomplete response.
/// Entries without coordinates are skipped.
pub fn location_results(raw: &Value) -> NormalizeResult<Vec<LocationResult>> {
    require_object(raw, "location autocomplete")?;

    let mut out = Vec::new();
    for item in candidate_results(raw) {
        let found = match item.str_at("type") {
            Some("place") => item.get("place").and_then(|place| {
                let coordinate = geocode(place)?;
                let name = place.str_at("name").unwrap_or("Unknown").to_string();
                let formatted = place.path(&["location", "formatted_address"]).and_then(Value::as_str);
                Some(LocationResult::new(name, Some(coordinate)).with_formatted_address(formatted.map(str::to_string)))
            }),
            Some("address") => {
                let coordinate = item
                    .path(&["geocodes", "main"])
                    .and_then(|g| Some(Coordinate::new(g.f64_at("latitude")?, g.f64_at("longitude")?)))
                    .or_else(|| center(item));
                coordinate.map(|c| {
                    let name = suggestion_text(item).unwrap_or_else(|| "Address".to_string());
                    let formatted = item.str_at("formatted_address").map(str::to_string);
                    LocationResult::new(name, Some(c)).with_formatted_address(formatted)
                })
            }
            Some("geo") => {
                let coordinate = center(item)
                    .or_else(|| item.get("geo").and_then(center))
                    .or_else(|| geocode(item));
                coordinate.map(|c| {
                    let name = suggestion_text(item).unwrap_or_else(|| "Area".to_string());
                    LocationResult::new(name, Some(c))
                })
            }
            _ => None,
        };
        out.extend(found);
    }
    Ok(out)
}
