// Recommendation metadata repository for place-discovery
// Append-only attribute/review lists keyed by place identity

use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::models::RecommendationData;
use super::DatabaseManager;

impl DatabaseManager {
    pub fn get_recommendation_data(&self) -> Result<Vec<RecommendationData>> {
        self.with_connection(|conn| {
            get_recommendation_data_impl(conn, None)
        })
    }

    pub fn get_recommendation_data_for(&self, identity: &str) -> Result<Vec<RecommendationData>> {
        self.with_connection(|conn| {
            get_recommendation_data_impl(conn, Some(identity))
        })
    }

    /// Store a new entry and return its id
    pub fn create_recommendation_data(
        &self,
        identity: &str,
        attributes: &[String],
        reviews: &[String],
        attribute_ratings: &BTreeMap<String, f64>,
    ) -> Result<String> {
        self.with_connection(|conn| {
            create_recommendation_data_impl(conn, identity, attributes, reviews, attribute_ratings)
        })
    }

    pub fn delete_recommendation_data(&self, id: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let deleted = conn.execute(
                "DELETE FROM recommendation_data WHERE id = ?",
                params![id],
            ).context("Failed to delete recommendation data")?;
            Ok(deleted > 0)
        })
    }

    pub fn delete_all_recommendation_data(&self) -> Result<usize> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM recommendation_data", [])
                .context("Failed to clear recommendation data")
        })
    }
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn get_recommendation_data_impl(conn: &Connection, identity: Option<&str>) -> Result<Vec<RecommendationData>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, identity, attributes, reviews, attribute_ratings, created_at
        FROM recommendation_data
        WHERE ?1 IS NULL OR identity = ?1
        ORDER BY created_at ASC, rowid ASC
        "#
    ).context("Failed to prepare get_recommendation_data query")?;

    let rows = stmt.query_map(params![identity], |row| {
        Ok(RecommendationData {
            id: row.get(0)?,
            identity: row.get(1)?,
            attributes: json_column(row, 2)?,
            reviews: json_column(row, 3)?,
            attribute_ratings: json_column(row, 4)?,
            created_at: row.get(5)?,
        })
    }).context("Failed to query recommendation data")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect recommendation data")
}

fn create_recommendation_data_impl(
    conn: &Connection,
    identity: &str,
    attributes: &[String],
    reviews: &[String],
    attribute_ratings: &BTreeMap<String, f64>,
) -> Result<String> {
    let id = format!("rd_{}", &Uuid::new_v4().to_string().replace('-', "")[..12]);

    conn.execute(
        r#"
        INSERT INTO recommendation_data (id, identity, attributes, reviews, attribute_ratings, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
        "#,
        params![
            id,
            identity,
            serde_json::to_string(attributes)?,
            serde_json::to_string(reviews)?,
            serde_json::to_string(attribute_ratings)?,
        ],
    ).context("Failed to create recommendation data")?;

    Ok(id)
}
