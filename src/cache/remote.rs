// Remote mirror seam - pushes committed local writes to a remote store

use anyhow::Result;
use async_trait::async_trait;

use crate::database::{CachedUserRecord, RecommendationData, RecordGroup};

/// Remote copy of the saved records.
///
/// Called only after the local store has committed the same change.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    async fn push_upsert(&self, record: &CachedUserRecord) -> Result<()>;
    async fn push_delete(&self, record: &CachedUserRecord) -> Result<()>;
    async fn push_rating(&self, identity: &str, rating: f64) -> Result<()>;
    async fn push_delete_group(&self, group: RecordGroup) -> Result<()>;
    async fn push_recommendation_data(&self, entry: &RecommendationData) -> Result<()>;
    async fn push_delete_recommendation_data(&self, id: &str) -> Result<()>;
}

/// Mirror that only logs; used when no remote store is configured
pub struct LogMirror;

#[async_trait]
impl RemoteMirror for LogMirror {
    async fn push_upsert(&self, record: &CachedUserRecord) -> Result<()> {
        log::debug!("Mirror upsert {} '{}'", record.group, record.identity);
        Ok(())
    }

    async fn push_delete(&self, record: &CachedUserRecord) -> Result<()> {
        log::debug!("Mirror delete {} '{}'", record.group, record.identity);
        Ok(())
    }

    async fn push_rating(&self, identity: &str, rating: f64) -> Result<()> {
        log::debug!("Mirror rating {} for '{}'", rating, identity);
        Ok(())
    }

    async fn push_delete_group(&self, group: RecordGroup) -> Result<()> {
        log::debug!("Mirror delete group {}", group);
        Ok(())
    }

    async fn push_recommendation_data(&self, entry: &RecommendationData) -> Result<()> {
        log::debug!("Mirror recommendation data for '{}'", entry.identity);
        Ok(())
    }

    async fn push_delete_recommendation_data(&self, id: &str) -> Result<()> {
        log::debug!("Mirror delete recommendation data {}", id);
        Ok(())
    }
}
