// Durable cache module
//
// - gateway.rs: CacheGateway, single-writer access to saved records plus the in-memory mirror
// - store.rs: RecordStore seam over the local database
// - remote.rs: RemoteMirror seam, pushed after each local commit
// - lifecycle.rs: background drain / hard cancel of outstanding operations

pub mod gateway;
pub mod lifecycle;
pub mod remote;
pub mod store;

use thiserror::Error;

use crate::database::RecordGroup;

pub use gateway::{CacheGateway, CacheMirror};
pub use lifecycle::{OperationGuard, OperationPriority, OperationTracker};
pub use remote::{LogMirror, RemoteMirror};
pub use store::RecordStore;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    #[error("cache commit failed: {0}")]
    Commit(String),
    #[error("failed to delete {} record group(s)", .0.len())]
    Partial(Vec<(RecordGroup, String)>),
    /// Local commit kept; the remote copy missed the change
    #[error("remote mirror push failed: {0}")]
    Mirror(String),
    #[error("cache operation cancelled")]
    Cancelled,
}
