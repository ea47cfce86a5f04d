//! Request types and query-string construction
//!
//! Builders are pure: they turn a request plus an optional coordinate into
//! ordered query pairs. The version date is added by the clients.

use serde::{Deserialize, Serialize};

use crate::intent::SearchSection;
use crate::models::Coordinate;

/// Query pairs in emission order
pub type QueryPairs = Vec<(String, String)>;

fn push(pairs: &mut QueryPairs, key: &str, value: impl ToString) {
    pairs.push((key.to_string(), value.to_string()));
}

/// Whether a free-text query is redundant with the structured filters
fn suppress_query(query: &str, categories: Option<&str>, label: Option<&str>) -> bool {
    let query = query.trim();
    query.is_empty()
        || categories.map_or(false, |c| !c.trim().is_empty())
        || label.map_or(false, |l| l.trim().eq_ignore_ascii_case(query))
}

/// Location pairs shared by both search endpoints.
///
/// A known coordinate with no near-location text sends `ll` and the caller's
/// radius. Near-location text sends `near` with the fixed fallback radius.
fn push_location(
    pairs: &mut QueryPairs,
    location: Option<Coordinate>,
    near_location: Option<&str>,
    ll: Option<&str>,
    radius: u32,
    near_radius: u32,
) {
    let near = near_location.map(str::trim).filter(|n| !n.is_empty());
    match (location, near) {
        (Some(coordinate), None) => {
            push(pairs, "ll", coordinate.ll());
            push(pairs, "radius", radius);
        }
        (_, Some(near)) => {
            push(pairs, "near", near);
            push(pairs, "radius", near_radius);
        }
        (None, None) => {
            if let Some(ll) = ll.filter(|ll| !ll.is_empty()) {
                push(pairs, "ll", ll);
            }
            push(pairs, "radius", radius);
        }
    }
}

/// Catalog place search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceSearchRequest {
    pub query: String,
    /// Explicit "lat,lon" used when no coordinate is supplied at call time
    pub ll: Option<String>,
    pub radius: u32,
    /// Comma-separated category ids
    pub categories: Option<String>,
    /// Label of the category being browsed; a query equal to it is dropped
    pub category_label: Option<String>,
    pub min_price: u8,
    pub max_price: u8,
    pub open_at: Option<String>,
    pub open_now: bool,
    pub near_location: Option<String>,
    pub sort: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for PlaceSearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            ll: None,
            radius: 20000,
            categories: None,
            category_label: None,
            min_price: 1,
            max_price: 4,
            open_at: None,
            open_now: false,
            near_location: None,
            sort: None,
            limit: 50,
            offset: 0,
        }
    }
}

impl PlaceSearchRequest {
    pub fn query_pairs(&self, location: Option<Coordinate>, near_radius: u32) -> QueryPairs {
        let mut pairs = QueryPairs::new();

        if !suppress_query(&self.query, self.categories.as_deref(), self.category_label.as_deref()) {
            push(&mut pairs, "query", self.query.trim());
        }

        push_location(
            &mut pairs,
            location,
            self.near_location.as_deref(),
            self.ll.as_deref(),
            self.radius,
            near_radius,
        );

        if let Some(categories) = self.categories.as_deref().filter(|c| !c.is_empty()) {
            push(&mut pairs, "categories", categories);
        }
        if self.min_price > 1 {
            push(&mut pairs, "min_price", self.min_price);
        }
        if self.max_price < 4 {
            push(&mut pairs, "max_price", self.max_price);
        }
        if let Some(open_at) = &self.open_at {
            push(&mut pairs, "open_at", open_at);
        }
        if self.open_now {
            push(&mut pairs, "open_now", "true");
        }
        if let Some(sort) = &self.sort {
            push(&mut pairs, "sort", sort);
        }
        push(&mut pairs, "limit", self.limit);
        if self.offset > 0 {
            push(&mut pairs, "offset", self.offset);
        }
        pairs
    }
}

/// Personalized recommendation search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendedSearchRequest {
    pub query: String,
    pub ll: Option<String>,
    pub radius: u32,
    pub categories: Option<String>,
    pub min_price: u8,
    pub max_price: u8,
    pub open_now: bool,
    pub near_location: Option<String>,
    pub limit: u32,
    pub offset: u32,
    pub section: Option<SearchSection>,
}

impl Default for RecommendedSearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            ll: None,
            radius: 20000,
            categories: None,
            min_price: 1,
            max_price: 4,
            open_now: false,
            near_location: None,
            limit: 50,
            offset: 0,
            section: None,
        }
    }
}

impl RecommendedSearchRequest {
    pub fn query_pairs(&self, location: Option<Coordinate>, near_radius: u32) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        let section_label = self.section.map(|s| s.label());

        if !suppress_query(&self.query, self.categories.as_deref(), section_label) {
            push(&mut pairs, "query", self.query.trim());
        }

        push_location(
            &mut pairs,
            location,
            self.near_location.as_deref(),
            self.ll.as_deref(),
            self.radius,
            near_radius,
        );

        let categories = self.categories.as_deref().filter(|c| !c.is_empty());
        if let Some(categories) = categories {
            push(&mut pairs, "categoryId", categories);
        }
        if self.min_price > 1 || self.max_price < 4 {
            let tiers: Vec<String> = (self.min_price.max(1)..=self.max_price.min(4))
                .map(|tier| tier.to_string())
                .collect();
            push(&mut pairs, "price", tiers.join(","));
        }
        if self.open_now {
            push(&mut pairs, "open_now", "true");
        }
        push(&mut pairs, "limit", self.limit);
        push(&mut pairs, "offset", self.offset);

        if let Some(section) = self.section {
            let query = self.query.trim();
            if categories.is_none() && (query.is_empty() || query.eq_ignore_ascii_case(section.label())) {
                push(&mut pairs, "section", section.key());
            }
        }
        pairs
    }

    /// Same filters expressed as a catalog request, for the non-personalized fallback
    pub fn to_catalog(&self) -> PlaceSearchRequest {
        PlaceSearchRequest {
            query: self.query.clone(),
            ll: self.ll.clone(),
            radius: self.radius,
            categories: self.categories.clone(),
            category_label: self.section.map(|s| s.label().to_string()),
            min_price: self.min_price,
            max_price: self.max_price,
            open_now: self.open_now,
            near_location: self.near_location.clone(),
            sort: Some("distance".to_string()),
            limit: self.limit,
            offset: self.offset,
            ..Default::default()
        }
    }
}

/// Optional fields of a place details request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetailField {
    Description,
    Tel,
    Fax,
    Email,
    Website,
    SocialMedia,
    Verified,
    Hours,
    HoursPopular,
    Rating,
    Stats,
    Popularity,
    Price,
    Menu,
    DateClosed,
    Photos,
    Tips,
    Tastes,
    Features,
}

impl DetailField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailField::Description => "description",
            DetailField::Tel => "tel",
            DetailField::Fax => "fax",
            DetailField::Email => "email",
            DetailField::Website => "website",
            DetailField::SocialMedia => "social_media",
            DetailField::Verified => "verified",
            DetailField::Hours => "hours",
            DetailField::HoursPopular => "hours_popular",
            DetailField::Rating => "rating",
            DetailField::Stats => "stats",
            DetailField::Popularity => "popularity",
            DetailField::Price => "price",
            DetailField::Menu => "menu",
            DetailField::DateClosed => "date_closed",
            DetailField::Photos => "photos",
            DetailField::Tips => "tips",
            DetailField::Tastes => "tastes",
            DetailField::Features => "features",
        }
    }
}

/// Fields always present on a catalog place
const CORE_FIELDS: &str = "fsq_id,name,geocodes,location,categories,chains,related_places,timezone,distance,link";

/// Fields requested when enriching a search hit
pub const ENRICHMENT_FIELDS: [DetailField; 11] = [
    DetailField::Description,
    DetailField::Tel,
    DetailField::Website,
    DetailField::SocialMedia,
    DetailField::Hours,
    DetailField::HoursPopular,
    DetailField::Rating,
    DetailField::Popularity,
    DetailField::Price,
    DetailField::Menu,
    DetailField::Tastes,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetailsRequest {
    pub place_id: String,
    pub fields: Vec<DetailField>,
    /// Also request the core summary fields
    pub core: bool,
}

impl PlaceDetailsRequest {
    /// Default enrichment mask; core fields only when the known summary has no name
    pub fn enrichment(place_id: impl Into<String>, summary_name: &str) -> Self {
        Self {
            place_id: place_id.into(),
            fields: ENRICHMENT_FIELDS.to_vec(),
            core: summary_name.is_empty(),
        }
    }

    /// Comma-separated `fields` value
    pub fn fields_param(&self) -> String {
        let mut fields: Vec<&str> = self.fields.iter().map(DetailField::as_str).collect();
        if self.core {
            fields.push(CORE_FIELDS);
        }
        fields.join(",")
    }
}
