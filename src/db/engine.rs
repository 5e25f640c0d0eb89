//! Database engine and connection management

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Database engine wrapper
///
/// Created once at startup and handed to the store that owns it; the pool
/// is closed explicitly on shutdown.
pub struct DbEngine {
    pool: SqlitePool,
    collection: String,
}

impl DbEngine {
    /// Open (creating if missing) the database file and its collection table
    pub async fn connect(db_path: &Path, collection: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30))
            .pragma("cache_size", "10000")
            .pragma("temp_store", "FILE");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Self::with_pool(pool, collection).await
    }

    /// Private in-memory database, kept alive on a single connection
    #[cfg(test)]
    pub async fn connect_in_memory(collection: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await
            .context("Failed to open in-memory database")?;

        Self::with_pool(pool, collection).await
    }

    async fn with_pool(pool: SqlitePool, collection: &str) -> Result<Self> {
        let engine = Self {
            pool,
            collection: collection.to_string(),
        };
        engine.create_tables().await?;
        Ok(engine)
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Table holding the artist documents
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn create_tables(&self) -> Result<()> {
        // seq keeps natural order and is never reused
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL DEFAULT '',
                response TEXT NOT NULL DEFAULT 'No' CHECK (response IN ('Yes', 'No')),
                available TEXT NOT NULL DEFAULT 'No' CHECK (available IN ('Yes', 'No')),
                cost REAL NOT NULL DEFAULT 0,
                saved INTEGER
            )
            "#,
            table = self.collection
        ))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to create collection {}", self.collection))?;

        Ok(())
    }
}
