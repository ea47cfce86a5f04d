// Place models - coordinates and normalized search hits
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance in meters
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// "lat,lon" form used for the `ll` query parameter and cached location identities
    pub fn ll(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// Parse the "lat,lon" form back into a coordinate
    pub fn parse_ll(raw: &str) -> Option<Self> {
        let (lat, lon) = raw.split_once(',')?;
        let latitude = lat.trim().parse().ok()?;
        let longitude = lon.trim().parse().ok()?;
        Some(Self { latitude, longitude })
    }
}

/// A normalized search or autocomplete hit.
///
/// `id` may be empty for geo and query suggestions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlaceSummary {
    pub id: String,
    pub name: String,
    pub categories: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub address_extended: String,
    pub locality: String,
    pub region: String,
    pub post_code: String,
    pub country: String,
    pub formatted_address: String,
    /// Neighborhood or designated market area
    pub neighborhood: String,
    pub chains: Vec<String>,
    pub link: String,
    pub child_ids: Vec<String>,
    pub parent_ids: Vec<String>,
}

impl PlaceSummary {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn has_coordinate(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

impl PartialEq for PlaceSummary {
    fn eq(&self, other: &Self) -> bool {
        if !self.id.is_empty() && !other.id.is_empty() {
            return self.id == other.id;
        }
        self.id == other.id
            && self.name == other.name
            && self.latitude == other.latitude
            && self.longitude == other.longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_by_provider_id() {
        let a = PlaceSummary { id: "abc".into(), name: "Sushi Bar".into(), ..Default::default() };
        let b = PlaceSummary { id: "abc".into(), name: "Renamed".into(), latitude: 1.0, ..Default::default() };
        assert_eq!(a, b);

        let geo_a = PlaceSummary { name: "Brooklyn".into(), latitude: 40.6, ..Default::default() };
        let geo_b = PlaceSummary { name: "Queens".into(), latitude: 40.6, ..Default::default() };
        assert_ne!(geo_a, geo_b);
    }

    #[test]
    fn test_ll_round_trip_and_distance() {
        let c = Coordinate::parse_ll("40.0,-73.0").unwrap();
        assert_eq!(c, Coordinate::new(40.0, -73.0));
        assert!(Coordinate::parse_ll("not a coordinate").is_none());

        // One degree of latitude is roughly 111 km
        let d = Coordinate::new(40.0, -73.0).distance_to(&Coordinate::new(41.0, -73.0));
        assert!((d - 111_195.0).abs() < 500.0);
    }
}
