// Database migrations for place-discovery
// Creates and updates the local store schema

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Run all necessary migrations to bring the database up to date
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    ).unwrap_or(false);

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    ).unwrap_or(0);

    Ok(version)
}

/// Saved user records plus the keyed-store and identity adapters (version 1)
fn migrate_v1(conn: &Connection) -> Result<()> {
    log::info!("Running database migration v1");

    conn.execute_batch(r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Saved locations, categories, tastes, places and lists
        CREATE TABLE IF NOT EXISTS user_cached_records (
            id TEXT PRIMARY KEY NOT NULL,
            record_group TEXT NOT NULL,
            identity TEXT NOT NULL,
            title TEXT NOT NULL,
            icons TEXT NOT NULL DEFAULT '',
            list TEXT NOT NULL DEFAULT '',
            section TEXT NOT NULL DEFAULT '',
            rating REAL NOT NULL DEFAULT 1.0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(record_group, identity)
        );

        CREATE INDEX IF NOT EXISTS idx_user_cached_records_group
        ON user_cached_records(record_group);

        CREATE INDEX IF NOT EXISTS idx_user_cached_records_identity
        ON user_cached_records(identity);

        -- Service keys, one record per service name
        CREATE TABLE IF NOT EXISTS key_strings (
            service TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        );

        -- Managed personalized-provider identities
        CREATE TABLE IF NOT EXISTS managed_users (
            user_id TEXT PRIMARY KEY NOT NULL,
            token TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT INTO schema_version (version) VALUES (1);
    "#).context("Failed to run migration v1")?;

    log::info!("Database migration v1 completed");
    Ok(())
}

/// Recommendation metadata (version 2)
fn migrate_v2(conn: &Connection) -> Result<()> {
    log::info!("Running database migration v2");

    conn.execute_batch(r#"
        CREATE TABLE IF NOT EXISTS recommendation_data (
            id TEXT PRIMARY KEY NOT NULL,
            identity TEXT NOT NULL,
            attributes TEXT NOT NULL DEFAULT '[]',
            reviews TEXT NOT NULL DEFAULT '[]',
            attribute_ratings TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_recommendation_data_identity
        ON recommendation_data(identity);

        INSERT INTO schema_version (version) VALUES (2);
    "#).context("Failed to run migration v2")?;

    log::info!("Database migration v2 completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_migrations() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let conn = Connection::open(&db_path).unwrap();

        run_migrations(&conn).unwrap();

        let version: i32 = conn.query_row(
            "SELECT MAX(version) FROM schema_version",
            [],
            |row| row.get(0),
        ).unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        // Running again is a no-op
        run_migrations(&conn).unwrap();
        let rows: i32 = conn.query_row(
            "SELECT COUNT(*) FROM schema_version",
            [],
            |row| row.get(0),
        ).unwrap();
        assert_eq!(rows, SCHEMA_VERSION);
    }
}
