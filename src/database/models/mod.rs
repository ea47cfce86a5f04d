// Database models - Re-exports the stored record types
//
// - user_record.rs: saved locations, categories, tastes, places and lists
// - recommendation_data.rs: recommendation metadata

mod user_record;
mod recommendation_data;

pub use user_record::{CachedUserRecord, RecordGroup};
pub use recommendation_data::RecommendationData;
