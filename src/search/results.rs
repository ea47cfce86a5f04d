// Published search results

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::SearchSection;
use crate::models::{Coordinate, LocationResult, PlaceDetails, PlaceSummary, RecommendedPlace};

/// One row in a place list: a catalog summary, a personalized hit, or both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: Uuid,
    /// Position in the provider response
    pub index: usize,
    pub title: String,
    pub list: String,
    pub section: SearchSection,
    /// User-assigned weight from saved places, 1.0 otherwise
    pub rating: f64,
    pub place: Option<PlaceSummary>,
    pub details: Option<PlaceDetails>,
    pub recommended: Option<RecommendedPlace>,
}

impl SearchResult {
    pub fn from_place(index: usize, place: PlaceSummary, list: &str, section: SearchSection) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            title: place.name.clone(),
            list: list.to_string(),
            section,
            rating: 1.0,
            place: Some(place),
            details: None,
            recommended: None,
        }
    }

    pub fn from_recommended(index: usize, recommended: RecommendedPlace, list: &str, section: SearchSection) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            title: recommended.name.clone(),
            list: list.to_string(),
            section,
            rating: 1.0,
            place: Some(recommended.to_summary()),
            details: None,
            recommended: Some(recommended),
        }
    }

    /// Provider id of the underlying place
    pub fn place_id(&self) -> Option<&str> {
        self.place
            .as_ref()
            .map(|p| p.id.as_str())
            .or_else(|| self.recommended.as_ref().map(|r| r.id.as_str()))
            .filter(|id| !id.is_empty())
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.place
            .as_ref()
            .filter(|p| p.has_coordinate())
            .map(|p| p.coordinate())
    }

    pub fn with_details(mut self, details: PlaceDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// Taxonomy entry under a parent category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub code: String,
    pub label: String,
}

/// A category, taste or section row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub id: Uuid,
    pub identity: String,
    pub title: String,
    pub list: String,
    pub section: SearchSection,
    pub rating: f64,
    pub children: Vec<CategoryEntry>,
}

impl CategoryResult {
    pub fn new(identity: impl Into<String>, list: impl Into<String>) -> Self {
        let identity = identity.into();
        Self {
            id: Uuid::new_v4(),
            title: identity.clone(),
            section: SearchSection::from_label(&identity).unwrap_or_default(),
            identity,
            list: list.into(),
            rating: 1.0,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<CategoryEntry>) -> Self {
        self.children = children;
        self
    }
}

/// The nine browsing sections, always offered
pub fn section_results() -> Vec<CategoryResult> {
    SearchSection::ALL
        .iter()
        .map(|section| CategoryResult::new(section.label(), "Section"))
        .collect()
}

/// Read-only copy of everything the orchestrator publishes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSnapshot {
    pub places: Vec<SearchResult>,
    pub recommended: Vec<SearchResult>,
    pub related: Vec<SearchResult>,
    pub selected_place_id: Option<String>,
    pub categories: Vec<CategoryResult>,
    pub tastes: Vec<CategoryResult>,
    pub sections: Vec<CategoryResult>,
    pub saved_categories: Vec<CategoryResult>,
    pub saved_tastes: Vec<CategoryResult>,
    pub saved_places: Vec<CategoryResult>,
    pub locations: Vec<LocationResult>,
    pub selected_destination: Option<LocationResult>,
    pub is_refreshing: bool,
}
