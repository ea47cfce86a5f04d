// Place details normalization

use serde_json::Value;
use std::collections::BTreeMap;

use super::value::ValueExt;
use super::{media, places, require_object, NormalizeResult};
use crate::models::{PlaceDetails, PlaceSummary, Photo, Tip};

/// Inputs that accompany a raw details payload
#[derive(Debug, Default)]
pub struct DetailsParts<'a> {
    /// Summary the details were requested for; re-parsed from the payload when its name is empty
    pub base: PlaceSummary,
    /// Separately fetched photos; falls back to photos embedded in the payload
    pub photos: Option<Vec<Photo>>,
    pub tips: Option<Vec<Tip>>,
    /// Earlier details, consulted for sticky fields
    pub previous: &'a [PlaceDetails],
}

pub fn place_details(raw: &Value, parts: DetailsParts<'_>) -> NormalizeResult<PlaceDetails> {
    require_object(raw, "place details")?;

    let mut summary = parts.base;
    if summary.name.is_empty() {
        if let Some(parsed) = places::place_summary(raw).filter(|s| !s.id.is_empty() || !s.name.is_empty()) {
            summary = parsed;
        }
    }

    let description = raw
        .str_at("description")
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .or_else(|| sticky_description(parts.previous, &summary.id));

    let social_media = raw
        .object_at("social_media")
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_id().map(|v| (k.clone(), v)))
                .collect()
        })
        .unwrap_or_default();

    let empty = Value::Null;
    let hours = raw.get("hours").unwrap_or(&empty);

    let hours_popular = raw
        .array_at("hours_popular")
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .map(|entry| {
                    entry
                        .iter()
                        .filter_map(|(k, v)| v.as_i64().map(|v| (k.clone(), v)))
                        .collect::<BTreeMap<_, _>>()
                })
                .collect()
        })
        .unwrap_or_default();

    let price = raw
        .i64_at("price")
        .filter(|p| (1..=4).contains(p))
        .map(|p| p as u8);

    let photos = match parts.photos {
        Some(photos) => photos,
        None => match raw.get("photos") {
            Some(embedded @ Value::Array(_)) => media::photos(embedded, &summary.id)?,
            _ => Vec::new(),
        },
    };
    let tips = match parts.tips {
        Some(tips) => tips,
        None => match raw.get("tips") {
            Some(embedded @ Value::Array(_)) => media::tips(embedded, &summary.id)?,
            _ => Vec::new(),
        },
    };

    let features = raw
        .object_at("features")
        .map(|map| flatten_features(map, ""))
        .unwrap_or_default();

    Ok(PlaceDetails {
        summary,
        description,
        tel: raw.str_at("tel").map(str::to_string),
        fax: raw.str_at("fax").map(str::to_string),
        email: raw.str_at("email").map(str::to_string),
        website: raw.str_at("website").map(str::to_string),
        social_media,
        hours: hours.str_at("display").map(str::to_string),
        open_now: hours.bool_at("open_now"),
        hours_popular,
        rating: raw.f64_at("rating"),
        popularity: raw.f64_at("popularity"),
        price,
        date_closed: raw.str_at("date_closed").map(str::to_string),
        tastes: raw.strings_at("tastes"),
        features,
        photos,
        tips,
    })
}

fn sticky_description(previous: &[PlaceDetails], id: &str) -> Option<String> {
    previous
        .iter()
        .rev()
        .filter(|d| d.id() == id)
        .find_map(|d| d.description.clone().filter(|desc| !desc.is_empty()))
}

/// Feature flags set to `true`, as dotted paths ("payment.credit_cards.visa")
fn flatten_features(map: &serde_json::Map<String, Value>, prefix: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Bool(true) => out.push(path),
            Value::Object(inner) => out.extend(flatten_features(inner, &path)),
            _ => {}
        }
    }
    out
}
