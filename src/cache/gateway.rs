//! Durable cache gateway
//!
//! Front door to saved user records. Writes are serialized through a single
//! writer lock and run on the blocking pool; the in-memory mirror only
//! changes after the store has committed. Each committed write is then pushed
//! to the remote mirror as a tracked operation, so backgrounding can demote
//! and later cancel it.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::lifecycle::{OperationGuard, OperationTracker};
use super::remote::{LogMirror, RemoteMirror};
use super::store::RecordStore;
use super::CacheError;
use crate::database::{CachedUserRecord, RecommendationData, RecordGroup};
use crate::models::{Coordinate, LocationResult};

const REFRESH_GROUPS: [RecordGroup; 5] = [
    RecordGroup::Location,
    RecordGroup::Category,
    RecordGroup::Taste,
    RecordGroup::Place,
    RecordGroup::List,
];
const REFRESH_STEPS: f64 = 6.0;

/// In-memory copy of the saved records
#[derive(Debug, Clone, Default)]
pub struct CacheMirror {
    pub locations: Vec<CachedUserRecord>,
    pub categories: Vec<CachedUserRecord>,
    pub tastes: Vec<CachedUserRecord>,
    pub places: Vec<CachedUserRecord>,
    pub lists: Vec<CachedUserRecord>,
    pub recommendation_data: Vec<RecommendationData>,
}

impl CacheMirror {
    fn group(&self, group: RecordGroup) -> &Vec<CachedUserRecord> {
        match group {
            RecordGroup::Location => &self.locations,
            RecordGroup::Category => &self.categories,
            RecordGroup::Taste => &self.tastes,
            RecordGroup::Place => &self.places,
            RecordGroup::List => &self.lists,
        }
    }

    fn group_mut(&mut self, group: RecordGroup) -> &mut Vec<CachedUserRecord> {
        match group {
            RecordGroup::Location => &mut self.locations,
            RecordGroup::Category => &mut self.categories,
            RecordGroup::Taste => &mut self.tastes,
            RecordGroup::Place => &mut self.places,
            RecordGroup::List => &mut self.lists,
        }
    }

    fn apply_upsert(&mut self, record: CachedUserRecord) {
        let records = self.group_mut(record.group);
        match records.iter_mut().find(|r| r.identity == record.identity) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    fn all_groups_mut(&mut self) -> [&mut Vec<CachedUserRecord>; 5] {
        [
            &mut self.locations,
            &mut self.categories,
            &mut self.tastes,
            &mut self.places,
            &mut self.lists,
        ]
    }
}

pub struct CacheGateway {
    store: Arc<dyn RecordStore>,
    remote: Arc<dyn RemoteMirror>,
    writer: Mutex<()>,
    mirror: RwLock<CacheMirror>,
    tracker: Arc<OperationTracker>,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn RecordStore>, tracker: Arc<OperationTracker>) -> Self {
        Self {
            store,
            remote: Arc::new(LogMirror),
            writer: Mutex::new(()),
            mirror: RwLock::new(CacheMirror::default()),
            tracker,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteMirror>) -> Self {
        self.remote = remote;
        self
    }

    pub fn tracker(&self) -> &Arc<OperationTracker> {
        &self.tracker
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RecordStore) -> anyhow::Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| CacheError::Commit(format!("store task failed: {}", e)))?
            .map_err(|e| CacheError::Commit(format!("{:#}", e)))
    }

    /// Push an already committed change, giving up when `op` is cancelled
    async fn push_remote<F>(&self, op: &OperationGuard, push: F) -> Result<(), CacheError>
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        if op.is_cancelled() {
            return Err(CacheError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = op.token().cancelled() => {
                log::warn!("Remote push {} cancelled", op.id());
                Err(CacheError::Cancelled)
            }
            result = push => result.map_err(|e| {
                log::error!("Remote push failed: {:#}", e);
                CacheError::Mirror(format!("{:#}", e))
            }),
        }
    }

    /// Records for `group`, read from the store
    pub async fn fetch_by_group(&self, group: RecordGroup) -> Result<Vec<CachedUserRecord>, CacheError> {
        self.blocking(move |store| store.records(group)).await
    }

    /// Records for `group` from the mirror
    pub async fn cached(&self, group: RecordGroup) -> Vec<CachedUserRecord> {
        self.mirror.read().await.group(group).clone()
    }

    pub async fn contains(&self, group: RecordGroup, identity: &str) -> bool {
        self.mirror
            .read()
            .await
            .group(group)
            .iter()
            .any(|r| r.identity == identity)
    }

    /// Save `record`, updating any existing record with the same group and identity
    pub async fn store(&self, record: CachedUserRecord) -> Result<String, CacheError> {
        let _writer = self.writer.lock().await;
        let op = self.tracker.register(format!("store {}", record.group));
        if op.is_cancelled() {
            return Err(CacheError::Cancelled);
        }

        let saved = self.blocking(move |store| store.upsert(&record)).await?;
        let id = saved.id.clone();
        self.mirror.write().await.apply_upsert(saved.clone());

        self.push_remote(&op, self.remote.push_upsert(&saved)).await?;
        Ok(id)
    }

    pub async fn update_rating(&self, identity: &str, rating: f64) -> Result<usize, CacheError> {
        let _writer = self.writer.lock().await;
        let op = self.tracker.register("update rating");
        let owned = identity.to_string();
        let updated = self
            .blocking(move |store| store.update_rating(&owned, rating))
            .await?;

        {
            let mut mirror = self.mirror.write().await;
            for records in mirror.all_groups_mut() {
                for record in records.iter_mut().filter(|r| r.identity == identity) {
                    record.rating = rating;
                }
            }
        }

        self.push_remote(&op, self.remote.push_rating(identity, rating)).await?;
        Ok(updated)
    }

    pub async fn delete(&self, record: &CachedUserRecord) -> Result<bool, CacheError> {
        let _writer = self.writer.lock().await;
        let op = self.tracker.register(format!("delete {}", record.group));
        let id = record.id.clone();
        let deleted = self.blocking(move |store| store.delete(&id)).await?;

        self.mirror
            .write()
            .await
            .group_mut(record.group)
            .retain(|r| r.id != record.id);

        self.push_remote(&op, self.remote.push_delete(record)).await?;
        Ok(deleted)
    }

    pub async fn delete_all_by_group(&self, group: RecordGroup) -> Result<usize, CacheError> {
        let _writer = self.writer.lock().await;
        let op = self.tracker.register(format!("delete group {}", group));
        let removed = self.blocking(move |store| store.delete_group(group)).await?;
        self.mirror.write().await.group_mut(group).clear();

        self.push_remote(&op, self.remote.push_delete_group(group)).await?;
        Ok(removed)
    }

    /// Clear every user group, continuing past failures.
    ///
    /// Returns the number of removed records, or `Partial` naming every group
    /// that failed.
    pub async fn delete_all_user_cached_groups(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        let mut failures = Vec::new();

        for group in RecordGroup::DELETABLE {
            match self.delete_all_by_group(group).await {
                Ok(count) => removed += count,
                Err(e) => {
                    log::error!("Failed to delete {} records: {}", group, e);
                    failures.push((group, e.to_string()));
                }
            }
        }

        if failures.is_empty() {
            Ok(removed)
        } else {
            Err(CacheError::Partial(failures))
        }
    }

    pub async fn recommendation_data(&self) -> Vec<RecommendationData> {
        self.mirror.read().await.recommendation_data.clone()
    }

    pub async fn store_recommendation_data(
        &self,
        identity: &str,
        attributes: Vec<String>,
        reviews: Vec<String>,
        attribute_ratings: BTreeMap<String, f64>,
    ) -> Result<String, CacheError> {
        let _writer = self.writer.lock().await;
        let op = self.tracker.register("store recommendation data");
        let owned = identity.to_string();
        let entry = self
            .blocking(move |store| {
                let id = store.create_recommendation_data(&owned, &attributes, &reviews, &attribute_ratings)?;
                Ok(RecommendationData {
                    id,
                    identity: owned,
                    attributes,
                    reviews,
                    attribute_ratings,
                    created_at: chrono::Utc::now().to_rfc3339(),
                })
            })
            .await?;

        let id = entry.id.clone();
        self.mirror.write().await.recommendation_data.push(entry.clone());

        self.push_remote(&op, self.remote.push_recommendation_data(&entry)).await?;
        Ok(id)
    }

    pub async fn delete_recommendation_data(&self, id: &str) -> Result<bool, CacheError> {
        let _writer = self.writer.lock().await;
        let op = self.tracker.register("delete recommendation data");
        let owned = id.to_string();
        let deleted = self
            .blocking(move |store| store.delete_recommendation_data(&owned))
            .await?;
        self.mirror
            .write()
            .await
            .recommendation_data
            .retain(|entry| entry.id != id);

        self.push_remote(&op, self.remote.push_delete_recommendation_data(id)).await?;
        Ok(deleted)
    }

    /// Reload every group and the recommendation data into the mirror.
    ///
    /// `progress` receives the completed fraction after each of the six steps.
    /// The mirror is replaced only when every step succeeds.
    pub async fn refresh<P>(&self, progress: P) -> Result<(), CacheError>
    where
        P: Fn(f64) + Send + Sync,
    {
        let op = self.tracker.register("refresh cache");
        let mut fresh = CacheMirror::default();
        let mut completed = 0.0;

        for group in REFRESH_GROUPS {
            if op.is_cancelled() {
                return Err(CacheError::Cancelled);
            }
            *fresh.group_mut(group) = self.fetch_by_group(group).await?;
            completed += 1.0;
            progress(completed / REFRESH_STEPS);
        }

        if op.is_cancelled() {
            return Err(CacheError::Cancelled);
        }
        fresh.recommendation_data = self.blocking(|store| store.recommendation_data()).await?;
        progress(REFRESH_STEPS / REFRESH_STEPS);

        *self.mirror.write().await = fresh;
        log::info!("Cache refreshed");
        Ok(())
    }

    pub async fn snapshot(&self) -> CacheMirror {
        self.mirror.read().await.clone()
    }

    /// Records of `group` sorted case-insensitively by title
    pub async fn sorted_results(&self, group: RecordGroup) -> Vec<CachedUserRecord> {
        let mut records = self.cached(group).await;
        records.sort_by_key(|r| r.title.to_lowercase());
        records
    }

    /// Saved locations whose identity is a "lat,lon" coordinate
    pub async fn cached_locations(&self) -> Vec<LocationResult> {
        self.mirror
            .read()
            .await
            .locations
            .iter()
            .filter_map(|record| {
                let coordinate = Coordinate::parse_ll(&record.identity)?;
                Some(LocationResult::new(record.title.clone(), Some(coordinate)))
            })
            .collect()
    }

    /// Empty the mirror; the store is untouched
    pub async fn clear(&self) {
        *self.mirror.write().await = CacheMirror::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    fn create_test_gateway() -> (CacheGateway, Arc<DatabaseManager>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Arc::new(DatabaseManager::new(dir.path().join("test.db")).unwrap());
        let tracker = Arc::new(OperationTracker::new(Duration::from_secs(20)));
        (CacheGateway::new(db.clone(), tracker), db, dir)
    }

    /// Store that fails every write for one group
    struct FlakyStore {
        inner: Arc<DatabaseManager>,
        failing: RecordGroup,
        delete_calls: AtomicUsize,
    }

    impl RecordStore for FlakyStore {
        fn records(&self, group: RecordGroup) -> anyhow::Result<Vec<CachedUserRecord>> {
            self.inner.records(group)
        }
        fn upsert(&self, record: &CachedUserRecord) -> anyhow::Result<CachedUserRecord> {
            if record.group == self.failing {
                anyhow::bail!("disk full");
            }
            self.inner.upsert(record)
        }
        fn update_rating(&self, identity: &str, rating: f64) -> anyhow::Result<usize> {
            self.inner.update_rating(identity, rating)
        }
        fn delete(&self, id: &str) -> anyhow::Result<bool> {
            self.inner.delete(id)
        }
        fn delete_group(&self, group: RecordGroup) -> anyhow::Result<usize> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            if group == self.failing {
                anyhow::bail!("locked");
            }
            self.inner.delete_group(group)
        }
        fn recommendation_data(&self) -> anyhow::Result<Vec<RecommendationData>> {
            self.inner.recommendation_data()
        }
        fn create_recommendation_data(
            &self,
            identity: &str,
            attributes: &[String],
            reviews: &[String],
            attribute_ratings: &BTreeMap<String, f64>,
        ) -> anyhow::Result<String> {
            RecordStore::create_recommendation_data(self.inner.as_ref(), identity, attributes, reviews, attribute_ratings)
        }
        fn delete_recommendation_data(&self, id: &str) -> anyhow::Result<bool> {
            RecordStore::delete_recommendation_data(self.inner.as_ref(), id)
        }
    }

    /// Remote mirror that fails every push
    struct OfflineRemote;

    #[async_trait::async_trait]
    impl RemoteMirror for OfflineRemote {
        async fn push_upsert(&self, _record: &CachedUserRecord) -> anyhow::Result<()> {
            anyhow::bail!("offline")
        }
        async fn push_delete(&self, _record: &CachedUserRecord) -> anyhow::Result<()> {
            anyhow::bail!("offline")
        }
        async fn push_rating(&self, _identity: &str, _rating: f64) -> anyhow::Result<()> {
            anyhow::bail!("offline")
        }
        async fn push_delete_group(&self, _group: RecordGroup) -> anyhow::Result<()> {
            anyhow::bail!("offline")
        }
        async fn push_recommendation_data(&self, _entry: &RecommendationData) -> anyhow::Result<()> {
            anyhow::bail!("offline")
        }
        async fn push_delete_recommendation_data(&self, _id: &str) -> anyhow::Result<()> {
            anyhow::bail!("offline")
        }
    }

    /// Remote mirror whose upserts hang until cancelled
    #[derive(Default)]
    struct StalledRemote {
        started: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl RemoteMirror for StalledRemote {
        async fn push_upsert(&self, _record: &CachedUserRecord) -> anyhow::Result<()> {
            self.started.notify_one();
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(())
        }
        async fn push_delete(&self, _record: &CachedUserRecord) -> anyhow::Result<()> {
            Ok(())
        }
        async fn push_rating(&self, _identity: &str, _rating: f64) -> anyhow::Result<()> {
            Ok(())
        }
        async fn push_delete_group(&self, _group: RecordGroup) -> anyhow::Result<()> {
            Ok(())
        }
        async fn push_recommendation_data(&self, _entry: &RecommendationData) -> anyhow::Result<()> {
            Ok(())
        }
        async fn push_delete_recommendation_data(&self, _id: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_local_commit() {
        let (gateway, db, _dir) = create_test_gateway();
        let gateway = gateway.with_remote(Arc::new(OfflineRemote));

        let result = gateway
            .store(CachedUserRecord::new(RecordGroup::Place, "p1", "Katz's"))
            .await;
        assert!(matches!(result, Err(CacheError::Mirror(_))));
        assert!(gateway.contains(RecordGroup::Place, "p1").await);
        assert_eq!(db.get_user_records(RecordGroup::Place).unwrap().len(), 1);

        let result = gateway.update_rating("p1", 3.0).await;
        assert!(matches!(result, Err(CacheError::Mirror(_))));
        assert_eq!(gateway.cached(RecordGroup::Place).await[0].rating, 3.0);
        assert_eq!(db.get_user_records(RecordGroup::Place).unwrap()[0].rating, 3.0);

        let result = gateway.delete_all_by_group(RecordGroup::Place).await;
        assert!(matches!(result, Err(CacheError::Mirror(_))));
        assert!(gateway.cached(RecordGroup::Place).await.is_empty());
        assert!(db.get_user_records(RecordGroup::Place).unwrap().is_empty());
        assert_eq!(gateway.tracker().outstanding(), 0);
    }

    #[tokio::test]
    async fn test_backgrounded_push_cancelled_after_grace() {
        let dir = tempdir().unwrap();
        let db = Arc::new(DatabaseManager::new(dir.path().join("test.db")).unwrap());
        let tracker = Arc::new(OperationTracker::new(Duration::from_millis(50)));
        let remote = Arc::new(StalledRemote::default());
        let gateway = Arc::new(CacheGateway::new(db.clone(), tracker.clone()).with_remote(remote.clone()));

        let pending = tokio::spawn({
            let gateway = gateway.clone();
            async move {
                gateway
                    .store(CachedUserRecord::new(RecordGroup::Taste, "cozy", "Cozy"))
                    .await
            }
        });

        remote.started.notified().await;
        assert_eq!(tracker.outstanding(), 1);
        tracker.enter_background();

        let result = tokio::time::timeout(Duration::from_secs(5), pending)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, Err(CacheError::Cancelled));
        assert!(gateway.contains(RecordGroup::Taste, "cozy").await);
        assert_eq!(db.get_user_records(RecordGroup::Taste).unwrap().len(), 1);
        assert_eq!(tracker.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_store_twice_is_one_record() {
        let (gateway, db, _dir) = create_test_gateway();

        let first = gateway
            .store(CachedUserRecord::new(RecordGroup::Taste, "cozy", "Cozy"))
            .await
            .unwrap();
        assert!(gateway.contains(RecordGroup::Taste, "cozy").await);

        let second = gateway
            .store(CachedUserRecord::new(RecordGroup::Taste, "cozy", "Cozy spots"))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(gateway.cached(RecordGroup::Taste).await.len(), 1);
        assert_eq!(db.get_user_records(RecordGroup::Taste).unwrap().len(), 1);
        assert_eq!(gateway.cached(RecordGroup::Taste).await[0].title, "Cozy spots");
    }

    #[tokio::test]
    async fn test_failed_write_leaves_mirror_untouched() {
        let dir = tempdir().unwrap();
        let db = Arc::new(DatabaseManager::new(dir.path().join("test.db")).unwrap());
        let store = Arc::new(FlakyStore {
            inner: db,
            failing: RecordGroup::Place,
            delete_calls: AtomicUsize::new(0),
        });
        let gateway = CacheGateway::new(store, Arc::new(OperationTracker::new(Duration::from_secs(20))));

        let result = gateway
            .store(CachedUserRecord::new(RecordGroup::Place, "p1", "Katz's"))
            .await;
        assert!(matches!(result, Err(CacheError::Commit(_))));
        assert!(!gateway.contains(RecordGroup::Place, "p1").await);
    }

    #[tokio::test]
    async fn test_delete_all_continues_past_failing_group() {
        let dir = tempdir().unwrap();
        let db = Arc::new(DatabaseManager::new(dir.path().join("test.db")).unwrap());
        db.upsert_user_record(&CachedUserRecord::new(RecordGroup::Taste, "cozy", "Cozy")).unwrap();
        db.upsert_user_record(&CachedUserRecord::new(RecordGroup::Place, "p1", "Katz's")).unwrap();
        let store = Arc::new(FlakyStore {
            inner: db.clone(),
            failing: RecordGroup::Category,
            delete_calls: AtomicUsize::new(0),
        });
        let gateway = CacheGateway::new(store.clone(), Arc::new(OperationTracker::new(Duration::from_secs(20))));

        let result = gateway.delete_all_user_cached_groups().await;
        match result {
            Err(CacheError::Partial(failures)) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].0, RecordGroup::Category);
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
        assert_eq!(store.delete_calls.load(Ordering::SeqCst), 4);
        assert!(db.get_user_records(RecordGroup::Taste).unwrap().is_empty());
        assert!(db.get_user_records(RecordGroup::Place).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_reports_progress_and_derives_locations() {
        let (gateway, db, _dir) = create_test_gateway();
        db.upsert_user_record(&CachedUserRecord::new(RecordGroup::Location, "40.7,-74", "Home")).unwrap();
        db.upsert_user_record(&CachedUserRecord::new(RecordGroup::Location, "not-a-coordinate", "Bad")).unwrap();
        db.upsert_user_record(&CachedUserRecord::new(RecordGroup::Category, "b", "bakeries")).unwrap();
        db.upsert_user_record(&CachedUserRecord::new(RecordGroup::Category, "a", "Arcades")).unwrap();

        let steps = std::sync::Mutex::new(Vec::new());
        gateway.refresh(|p| steps.lock().unwrap().push(p)).await.unwrap();

        let steps = steps.into_inner().unwrap();
        assert_eq!(steps.len(), 6);
        assert_eq!(steps.last().copied(), Some(1.0));

        let locations = gateway.cached_locations().await;
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].coordinate, Some(Coordinate::new(40.7, -74.0)));

        let titles: Vec<_> = gateway
            .sorted_results(RecordGroup::Category)
            .await
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Arcades", "bakeries"]);

        gateway.clear().await;
        assert!(gateway.cached(RecordGroup::Category).await.is_empty());
    }

    #[tokio::test]
    async fn test_rating_and_recommendation_data() {
        let (gateway, _db, _dir) = create_test_gateway();
        gateway
            .store(CachedUserRecord::new(RecordGroup::Place, "p1", "Katz's"))
            .await
            .unwrap();
        assert_eq!(gateway.update_rating("p1", 4.0).await.unwrap(), 1);
        assert_eq!(gateway.cached(RecordGroup::Place).await[0].rating, 4.0);

        let id = gateway
            .store_recommendation_data("p1", vec!["pastrami".into()], vec![], BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(gateway.recommendation_data().await.len(), 1);
        assert!(gateway.delete_recommendation_data(&id).await.unwrap());
        assert!(gateway.recommendation_data().await.is_empty());
    }
}
