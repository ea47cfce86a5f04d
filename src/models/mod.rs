// Canonical place models - re-exports the normalized value types
//
// - place.rs: coordinates and place summaries
// - details.rs: place details with photos and tips
// - media.rs: photos and tips
// - recommendation.rs: personalized recommendation results
// - location.rs: named destination locations

mod place;
mod details;
mod media;
mod recommendation;
mod location;

pub use place::{Coordinate, PlaceSummary};
pub use details::PlaceDetails;
pub use media::{Photo, Tip};
pub use recommendation::{RecommendedPlace, TasteSuggestion};
pub use location::{LocationResult, CURRENT_LOCATION_NAME};
