// Personalized recommendation results
use serde::{Deserialize, Serialize};

use super::PlaceSummary;

/// A hit from the personalized recommendation or related-venues endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RecommendedPlace {
    pub id: String,
    pub name: String,
    pub categories: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub neighborhood: String,
    pub address: String,
    pub country: String,
    pub city: String,
    pub state: String,
    pub post_code: String,
    pub formatted_address: String,
    /// Hero photo URL
    pub photo: Option<String>,
    pub aspect_ratio: Option<f64>,
    pub photos: Vec<String>,
    pub tastes: Vec<String>,
}

impl RecommendedPlace {
    /// Project onto the generic summary shape
    pub fn to_summary(&self) -> PlaceSummary {
        PlaceSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            categories: self.categories.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address.clone(),
            address_extended: self.formatted_address.clone(),
            locality: self.city.clone(),
            region: self.state.clone(),
            post_code: self.post_code.clone(),
            country: self.country.clone(),
            formatted_address: self.formatted_address.clone(),
            neighborhood: self.neighborhood.clone(),
            ..Default::default()
        }
    }
}

impl From<&RecommendedPlace> for PlaceSummary {
    fn from(place: &RecommendedPlace) -> Self {
        place.to_summary()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TasteSuggestion {
    pub id: String,
    pub text: String,
}
