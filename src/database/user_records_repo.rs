// Saved user records repository for place-discovery
// CRUD over user_cached_records, deduplicated on (record_group, identity)

use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::models::{CachedUserRecord, RecordGroup};
use super::DatabaseManager;

const RECORD_COLUMNS: &str =
    "id, record_group, identity, title, icons, list, section, rating, created_at, updated_at";

impl DatabaseManager {
    /// All records in a group, oldest first
    pub fn get_user_records(&self, group: RecordGroup) -> Result<Vec<CachedUserRecord>> {
        self.with_connection(|conn| {
            get_user_records_impl(conn, group)
        })
    }

    pub fn get_user_record(&self, group: RecordGroup, identity: &str) -> Result<Option<CachedUserRecord>> {
        self.with_connection(|conn| {
            get_user_record_impl(conn, group, identity)
        })
    }

    pub fn contains_user_record(&self, group: RecordGroup, identity: &str) -> Result<bool> {
        Ok(self.get_user_record(group, identity)?.is_some())
    }

    /// Insert a record, or update the existing one with the same group and identity.
    /// Returns the stored row, including its id.
    pub fn upsert_user_record(&self, record: &CachedUserRecord) -> Result<CachedUserRecord> {
        self.with_transaction(|conn| {
            upsert_user_record_impl(conn, record)?;
            get_user_record_impl(conn, record.group, &record.identity)?
                .context("Upserted record not found")
        })
    }

    /// Set the rating on every record with this identity. Returns rows touched.
    pub fn update_user_record_rating(&self, identity: &str, rating: f64) -> Result<usize> {
        self.with_connection(|conn| {
            update_rating_impl(conn, identity, rating)
        })
    }

    pub fn delete_user_record(&self, id: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let deleted = conn.execute(
                "DELETE FROM user_cached_records WHERE id = ?",
                params![id],
            ).context("Failed to delete user record")?;
            Ok(deleted > 0)
        })
    }

    /// Delete every record in a group. Returns rows removed.
    pub fn delete_user_records_in_group(&self, group: RecordGroup) -> Result<usize> {
        self.with_connection(|conn| {
            conn.execute(
                "DELETE FROM user_cached_records WHERE record_group = ?",
                params![group.as_str()],
            ).with_context(|| format!("Failed to delete {} records", group))
        })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CachedUserRecord> {
    let group: String = row.get(1)?;
    let group = group
        .parse::<RecordGroup>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, e.into()))?;

    Ok(CachedUserRecord {
        id: row.get(0)?,
        group,
        identity: row.get(2)?,
        title: row.get(3)?,
        icons: row.get(4)?,
        list: row.get(5)?,
        section: row.get(6)?,
        rating: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn get_user_records_impl(conn: &Connection, group: RecordGroup) -> Result<Vec<CachedUserRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM user_cached_records WHERE record_group = ? ORDER BY created_at ASC, rowid ASC",
        RECORD_COLUMNS
    )).context("Failed to prepare get_user_records query")?;

    let records = stmt.query_map(params![group.as_str()], record_from_row)
        .context("Failed to query user records")?;

    records.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect user records")
}

fn get_user_record_impl(conn: &Connection, group: RecordGroup, identity: &str) -> Result<Option<CachedUserRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM user_cached_records WHERE record_group = ? AND identity = ?",
        RECORD_COLUMNS
    )).context("Failed to prepare get_user_record query")?;

    match stmt.query_row(params![group.as_str(), identity], record_from_row) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get user record"),
    }
}

fn upsert_user_record_impl(conn: &Connection, record: &CachedUserRecord) -> Result<()> {
    let id = if record.id.is_empty() {
        format!("rec_{}", &Uuid::new_v4().to_string().replace('-', "")[..12])
    } else {
        record.id.clone()
    };

    conn.execute(
        r#"
        INSERT INTO user_cached_records
            (id, record_group, identity, title, icons, list, section, rating, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'), datetime('now'))
        ON CONFLICT(record_group, identity) DO UPDATE SET
            title = excluded.title,
            icons = excluded.icons,
            list = excluded.list,
            section = excluded.section,
            rating = excluded.rating,
            updated_at = datetime('now')
        "#,
        params![
            id,
            record.group.as_str(),
            record.identity,
            record.title,
            record.icons,
            record.list,
            record.section,
            record.rating,
        ],
    ).context("Failed to upsert user record")?;

    Ok(())
}

fn update_rating_impl(conn: &Connection, identity: &str, rating: f64) -> Result<usize> {
    conn.execute(
        "UPDATE user_cached_records SET rating = ?, updated_at = datetime('now') WHERE identity = ?",
        params![rating, identity],
    ).context("Failed to update user record rating")
}
