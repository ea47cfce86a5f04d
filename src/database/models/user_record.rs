// Database models - saved user records
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record groups, each an independent identity namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordGroup {
    Location,
    Category,
    Taste,
    Place,
    List,
}

impl RecordGroup {
    /// Groups cleared by a bulk delete of all user data
    pub const DELETABLE: [RecordGroup; 4] = [
        RecordGroup::Location,
        RecordGroup::Category,
        RecordGroup::Taste,
        RecordGroup::Place,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordGroup::Location => "location",
            RecordGroup::Category => "category",
            RecordGroup::Taste => "taste",
            RecordGroup::Place => "place",
            RecordGroup::List => "list",
        }
    }
}

impl fmt::Display for RecordGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordGroup {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "location" => Ok(RecordGroup::Location),
            "category" => Ok(RecordGroup::Category),
            "taste" => Ok(RecordGroup::Taste),
            "place" => Ok(RecordGroup::Place),
            "list" => Ok(RecordGroup::List),
            other => Err(anyhow::anyhow!("Unknown record group: {}", other)),
        }
    }
}

/// Something the user saved: a location, category, taste, place or list.
/// `(group, identity)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedUserRecord {
    pub id: String,
    pub group: RecordGroup,
    /// Category name, taste name, "lat,lon" string, or provider place id
    pub identity: String,
    pub title: String,
    pub icons: String,
    pub list: String,
    pub section: String,
    /// User-assigned weight, not a provider rating
    pub rating: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl CachedUserRecord {
    pub fn new(group: RecordGroup, identity: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            group,
            identity: identity.into(),
            title: title.into(),
            icons: String::new(),
            list: String::new(),
            section: String::new(),
            rating: 1.0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn with_list(mut self, list: impl Into<String>) -> Self {
        self.list = list.into();
        self
    }

    pub fn with_icons(mut self, icons: impl Into<String>) -> Self {
        self.icons = icons.into();
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }
}
