// Place-data provider clients
//
// - service.rs: CatalogSearch / PersonalizedSearch contracts
// - catalog.rs: v3 catalog client (service-key auth)
// - personalized.rs: v2 recommendations client (bearer-token auth)
// - managed_user.rs: managed user provisioning
// - transport.rs: HTTP seam and the reqwest implementation
// - request.rs: search request types and query assembly
// - retry.rs: single in-flight session retry gate
// - error.rs: provider errors and response classification

pub mod catalog;
pub mod error;
pub mod managed_user;
pub mod personalized;
pub mod request;
pub mod retry;
pub mod service;
pub mod transport;

pub use catalog::{center_of, CatalogClient};
pub use error::ProviderError;
pub use managed_user::ManagedUserClient;
pub use personalized::PersonalizedClient;
pub use request::{DetailField, PlaceDetailsRequest, PlaceSearchRequest, QueryPairs, RecommendedSearchRequest};
pub use retry::SessionRetryGate;
pub use service::{CatalogSearch, PersonalizedSearch};
pub use transport::{ApiRequest, HttpMethod, HttpTransport, ReqwestTransport};
