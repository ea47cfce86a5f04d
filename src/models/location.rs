// Named destination locations
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Coordinate;

pub const CURRENT_LOCATION_NAME: &str = "Current Location";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResult {
    pub id: String,
    pub name: String,
    pub coordinate: Option<Coordinate>,
    pub formatted_address: Option<String>,
}

impl LocationResult {
    pub fn new(name: impl Into<String>, coordinate: Option<Coordinate>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            coordinate,
            formatted_address: None,
        }
    }

    pub fn with_formatted_address(mut self, formatted: Option<String>) -> Self {
        self.formatted_address = formatted;
        self
    }

    /// Placeholder for the device location, rebound as the device moves
    pub fn current(coordinate: Option<Coordinate>) -> Self {
        Self::new(CURRENT_LOCATION_NAME, coordinate)
    }

    pub fn is_current_location(&self) -> bool {
        self.name == CURRENT_LOCATION_NAME
    }
}

impl PartialEq for LocationResult {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.coordinate == other.coordinate
    }
}
