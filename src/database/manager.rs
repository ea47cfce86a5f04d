// Database Manager for place-discovery
// Owns the SQLite connection behind the durable cache and keyed-store adapters

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

use super::migrations;
use crate::config::DiscoveryConfig;

/// Database manager that owns the SQLite connection
pub struct DatabaseManager {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DatabaseManager {
    /// Create a new DatabaseManager with the database at the specified path
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create database directory")?;
        }

        let conn = Connection::open(&db_path)
            .context("Failed to open database")?;

        // Enable foreign keys
        conn.execute("PRAGMA foreign_keys = ON", [])
            .context("Failed to enable foreign keys")?;

        migrations::run_migrations(&conn)
            .context("Failed to run database migrations")?;

        log::info!("Database initialized at: {:?}", db_path);

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Open the database at the configured location
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self> {
        Self::new(config.db_path.clone())
    }

    /// Execute a function with access to the database connection
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock()
            .map_err(|e| anyhow::anyhow!("Failed to lock database connection: {}", e))?;
        f(&conn)
    }

    /// Execute a function inside a transaction; rolled back if `f` fails
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock()
            .map_err(|e| anyhow::anyhow!("Failed to lock database connection: {}", e))?;
        let tx = conn.transaction().context("Failed to begin transaction")?;
        let value = f(&tx)?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(value)
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }
}
