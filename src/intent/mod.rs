// Intent module - classified query turns
//
// - model.rs: Intent, Fulfillment, IntentHistory
// - classifier.rs: heuristic classification and default request parameters
// - section.rs: personalized search sections

pub mod classifier;
pub mod model;
pub mod section;

pub use classifier::{classify, default_parameters, describe, search_request, split_near_clause, SearchFilters};
pub use model::{Classification, Fulfillment, Intent, IntentHistory, IntentType};
pub use section::SearchSection;
