//! SQLite persistence for served collections.
//!
//! Each child is one row keyed by `(collection, key)`. The live copy of a
//! collection is held in memory; this table only has to survive restarts.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::models::Item;

/// Errors from opening or using the database.
#[derive(Debug)]
pub enum StorageError {
    /// Could not create the database directory
    IoError(PathBuf, io::Error),
    /// Query or connection failure
    Database(sqlx::Error),
    /// Migration failure
    Migration(sqlx::migrate::MigrateError),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::Database(e) => write!(f, "Database error: {}", e),
            StorageError::Migration(e) => write!(f, "Migration failed: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            StorageError::Database(e) => Some(e),
            StorageError::Migration(e) => Some(e),
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Database(e)
    }
}

/// Opens (creating if needed) the database at `path` and runs migrations.
pub async fn open_database(path: &Path) -> Result<SqlitePool, StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StorageError::IoError(parent.to_path_buf(), e))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(StorageError::Migration)?;

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct ChildRow {
    key: String,
    id: String,
    name: String,
}

/// Rows of one collection.
#[derive(Debug, Clone)]
pub struct ItemTable {
    pool: SqlitePool,
    collection: String,
}

impl ItemTable {
    pub fn new(pool: SqlitePool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// All children of the collection, in no particular order.
    pub async fn load_all(&self) -> Result<Vec<(String, Item)>, sqlx::Error> {
        let rows: Vec<ChildRow> =
            sqlx::query_as("SELECT key, id, name FROM children WHERE collection = ?")
                .bind(&self.collection)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.key, Item::new(row.id, row.name)))
            .collect())
    }

    /// Inserts or overwrites the child under `key`.
    pub async fn upsert(&self, key: &str, item: &Item) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO children (collection, key, id, name)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (collection, key) DO UPDATE SET id = excluded.id, name = excluded.name
            "#,
        )
        .bind(&self.collection)
        .bind(key)
        .bind(&item.id)
        .bind(&item.name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes the child under `key`. Returns false if it did not exist.
    pub async fn remove(&self, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM children WHERE collection = ? AND key = ?")
            .bind(&self.collection)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
