// Place details - a summary enriched by the details, photos and tips endpoints
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Photo, PlaceSummary, Tip};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlaceDetails {
    pub summary: PlaceSummary,
    /// Sticky: backfilled from earlier details for the same place when a refresh omits it
    pub description: Option<String>,
    pub tel: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub social_media: BTreeMap<String, String>,
    pub hours: Option<String>,
    pub open_now: Option<bool>,
    /// Popular-hours histogram entries (day/open/close keyed integers)
    pub hours_popular: Vec<BTreeMap<String, i64>>,
    pub rating: Option<f64>,
    pub popularity: Option<f64>,
    /// Price tier 1-4
    pub price: Option<u8>,
    pub date_closed: Option<String>,
    pub tastes: Vec<String>,
    pub features: Vec<String>,
    pub photos: Vec<Photo>,
    pub tips: Vec<Tip>,
}

impl PlaceDetails {
    pub fn id(&self) -> &str {
        &self.summary.id
    }

    pub fn hero_photo(&self) -> Option<&Photo> {
        self.photos.first()
    }
}
