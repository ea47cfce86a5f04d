// Database models - recommendation metadata
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-text attributes and reviews keyed by place identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RecommendationData {
    pub id: String,
    pub identity: String,
    pub attributes: Vec<String>,
    pub reviews: Vec<String>,
    pub attribute_ratings: BTreeMap<String, f64>,
    pub created_at: String,
}
