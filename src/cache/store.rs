// Record store seam between the cache gateway and the local database

use anyhow::Result;
use std::collections::BTreeMap;

use crate::database::{CachedUserRecord, DatabaseManager, RecommendationData, RecordGroup};

/// Blocking persistence for saved records and recommendation metadata
pub trait RecordStore: Send + Sync {
    fn records(&self, group: RecordGroup) -> Result<Vec<CachedUserRecord>>;
    fn upsert(&self, record: &CachedUserRecord) -> Result<CachedUserRecord>;
    fn update_rating(&self, identity: &str, rating: f64) -> Result<usize>;
    fn delete(&self, id: &str) -> Result<bool>;
    fn delete_group(&self, group: RecordGroup) -> Result<usize>;

    fn recommendation_data(&self) -> Result<Vec<RecommendationData>>;
    fn create_recommendation_data(
        &self,
        identity: &str,
        attributes: &[String],
        reviews: &[String],
        attribute_ratings: &BTreeMap<String, f64>,
    ) -> Result<String>;
    fn delete_recommendation_data(&self, id: &str) -> Result<bool>;
}

impl RecordStore for DatabaseManager {
    fn records(&self, group: RecordGroup) -> Result<Vec<CachedUserRecord>> {
        self.get_user_records(group)
    }

    fn upsert(&self, record: &CachedUserRecord) -> Result<CachedUserRecord> {
        self.upsert_user_record(record)
    }

    fn update_rating(&self, identity: &str, rating: f64) -> Result<usize> {
        self.update_user_record_rating(identity, rating)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.delete_user_record(id)
    }

    fn delete_group(&self, group: RecordGroup) -> Result<usize> {
        self.delete_user_records_in_group(group)
    }

    fn recommendation_data(&self) -> Result<Vec<RecommendationData>> {
        self.get_recommendation_data()
    }

    fn create_recommendation_data(
        &self,
        identity: &str,
        attributes: &[String],
        reviews: &[String],
        attribute_ratings: &BTreeMap<String, f64>,
    ) -> Result<String> {
        DatabaseManager::create_recommendation_data(self, identity, attributes, reviews, attribute_ratings)
    }

    fn delete_recommendation_data(&self, id: &str) -> Result<bool> {
        DatabaseManager::delete_recommendation_data(self, id)
    }
}
