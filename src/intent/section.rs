// Personalized search sections

use serde::{Deserialize, Serialize};

/// Browsing sections understood by the recommendation endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SearchSection {
    Food,
    Drinks,
    Coffee,
    Shopping,
    Arts,
    Outdoors,
    Sightseeing,
    Trending,
    #[default]
    TopPicks,
}

impl SearchSection {
    pub const ALL: [SearchSection; 9] = [
        SearchSection::Food,
        SearchSection::Drinks,
        SearchSection::Coffee,
        SearchSection::Shopping,
        SearchSection::Arts,
        SearchSection::Outdoors,
        SearchSection::Sightseeing,
        SearchSection::Trending,
        SearchSection::TopPicks,
    ];

    /// Display label, also used as the section's cached identity
    pub fn label(&self) -> &'static str {
        match self {
            SearchSection::Food => "Food",
            SearchSection::Drinks => "Drinks",
            SearchSection::Coffee => "Coffee",
            SearchSection::Shopping => "Shopping",
            SearchSection::Arts => "Arts",
            SearchSection::Outdoors => "Outdoors",
            SearchSection::Sightseeing => "Sightseeing",
            SearchSection::Trending => "Trending places",
            SearchSection::TopPicks => "Popular places",
        }
    }

    /// Provider `section` parameter value
    pub fn key(&self) -> &'static str {
        match self {
            SearchSection::Food => "food",
            SearchSection::Drinks => "drinks",
            SearchSection::Coffee => "coffee",
            SearchSection::Shopping => "shops",
            SearchSection::Arts => "arts",
            SearchSection::Outdoors => "outdoors",
            SearchSection::Sightseeing => "sights",
            SearchSection::Trending => "trending",
            SearchSection::TopPicks => "topPicks",
        }
    }

    /// Case-insensitive match on label or key
    pub fn from_label(text: &str) -> Option<SearchSection> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(text) || s.key().eq_ignore_ascii_case(text))
    }
}
