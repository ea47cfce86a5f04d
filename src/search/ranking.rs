// Result ordering

use std::cmp::Ordering;

use super::results::SearchResult;
use crate::models::Coordinate;

/// Baseline order: case-insensitive title
pub fn sort_alphabetically(results: &mut [SearchResult]) {
    results.sort_by_key(|r| r.title.to_lowercase());
}

/// Stable ascending sort by distance from `destination`; results without a
/// coordinate go last
pub fn sort_by_distance(results: &mut [SearchResult], destination: Coordinate) {
    results.sort_by(|a, b| {
        let da = a.coordinate().map(|c| c.distance_to(&destination));
        let db = b.coordinate().map(|c| c.distance_to(&destination));
        match (da, db) {
            (Some(da), Some(db)) => da.partial_cmp(&db).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Rating descending, then provider index
pub fn sort_by_rating(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
}
