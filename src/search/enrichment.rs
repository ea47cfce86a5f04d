// Detail enrichment - details, photos and tips for a batch of places

use futures_util::future::join_all;

use super::SearchError;
use crate::models::{PlaceDetails, PlaceSummary};
use crate::normalizer::{self, DetailsParts};
use crate::providers::{CatalogSearch, PlaceDetailsRequest};

/// Outcome for one place of a batch
pub struct Enriched {
    pub place_id: String,
    pub details: Result<PlaceDetails, SearchError>,
}

/// Fetch details for every place concurrently.
///
/// Photos and tips are fetched alongside the details when `include_media` is
/// set. The batch resolves once every place has finished; a failure is
/// reported for that place only.
pub async fn fetch_details(
    catalog: &dyn CatalogSearch,
    places: &[PlaceSummary],
    include_media: bool,
    previous: &[PlaceDetails],
) -> Vec<Enriched> {
    join_all(places.iter().map(|place| async move {
        Enriched {
            place_id: place.id.clone(),
            details: fetch_one(catalog, place, include_media, previous).await,
        }
    }))
    .await
}

async fn fetch_one(
    catalog: &dyn CatalogSearch,
    place: &PlaceSummary,
    include_media: bool,
    previous: &[PlaceDetails],
) -> Result<PlaceDetails, SearchError> {
    let request = PlaceDetailsRequest::enrichment(place.id.clone(), &place.name);

    let media = async {
        if !include_media {
            return (None, None);
        }
        let (photos, tips) = tokio::join!(catalog.photos(&place.id), catalog.tips(&place.id));
        let photos = photos
            .map_err(|e| log::warn!("Photos unavailable for {}: {}", place.id, e))
            .ok();
        let tips = tips
            .map_err(|e| log::warn!("Tips unavailable for {}: {}", place.id, e))
            .ok();
        (photos, tips)
    };

    let (raw, (photos, tips)) = tokio::join!(catalog.details(&request), media);
    let raw = raw?;

    let details = normalizer::place_details(
        &raw,
        DetailsParts {
            base: place.clone(),
            photos,
            tips,
            previous,
        },
    )?;
    Ok(details)
}

/// Insert or replace `details` by place id
pub fn merge_details(existing: &mut Vec<PlaceDetails>, details: PlaceDetails) {
    match existing.iter_mut().find(|d| d.id() == details.id()) {
        Some(slot) => *slot = details,
        None => existing.push(details),
    }
}
