// Keyed-store and managed identity repository for place-discovery
// Local adapters for service keys and the personalized-provider identity

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::DatabaseManager;

/// A managed identity and its access token
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedUser {
    pub user_id: String,
    pub token: String,
}

impl DatabaseManager {
    pub fn get_key_string(&self, service: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            get_key_string_impl(conn, service)
        })
    }

    pub fn set_key_string(&self, service: &str, value: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO key_strings (service, value) VALUES (?1, ?2)
                ON CONFLICT(service) DO UPDATE SET value = excluded.value
                "#,
                params![service, value],
            ).context("Failed to set key string")?;
            Ok(())
        })
    }

    pub fn delete_key_string(&self, service: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let deleted = conn.execute(
                "DELETE FROM key_strings WHERE service = ?",
                params![service],
            ).context("Failed to delete key string")?;
            Ok(deleted > 0)
        })
    }

    /// The stored identity matching `user_id`, or the earliest one when no id is given
    pub fn get_managed_user(&self, user_id: Option<&str>) -> Result<Option<ManagedUser>> {
        self.with_connection(|conn| {
            get_managed_user_impl(conn, user_id)
        })
    }

    pub fn save_managed_user(&self, user_id: &str, token: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO managed_users (user_id, token, created_at) VALUES (?1, ?2, datetime('now'))
                ON CONFLICT(user_id) DO UPDATE SET token = excluded.token
                "#,
                params![user_id, token],
            ).context("Failed to save managed user")?;
            Ok(())
        })
    }
}

fn get_key_string_impl(conn: &Connection, service: &str) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT value FROM key_strings WHERE service = ? LIMIT 1",
        params![service],
        |row| row.get(0),
    );

    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get key string"),
    }
}

fn get_managed_user_impl(conn: &Connection, user_id: Option<&str>) -> Result<Option<ManagedUser>> {
    let result = conn.query_row(
        r#"
        SELECT user_id, token FROM managed_users
        WHERE ?1 IS NULL OR user_id = ?1
        ORDER BY created_at ASC, rowid ASC
        LIMIT 1
        "#,
        params![user_id],
        |row| Ok(ManagedUser { user_id: row.get(0)?, token: row.get(1)? }),
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get managed user"),
    }
}
