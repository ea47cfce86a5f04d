// Database module for place-discovery
// SQLite persistence for saved user records, recommendation metadata, service keys and managed identities

pub mod manager;
pub mod migrations;
pub mod models;
pub mod user_records_repo;
pub mod recommendation_repo;
pub mod credentials_repo;

pub use manager::DatabaseManager;
pub use credentials_repo::ManagedUser;
pub use models::*;
