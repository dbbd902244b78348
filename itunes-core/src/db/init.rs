//! Store initialization: connection, PRAGMA tuning, migration.

use super::migrations;
use crate::error::Error;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// An open, migrated library store plus the path it was opened from.
///
/// Cloning the inner pool is cheap (it's a connection-pool handle), so
/// [`StoreHandle`] is itself cheap to clone and share across the refresh
/// lifecycle and the query/cache layers.
#[derive(Clone)]
pub struct StoreHandle {
    pool: SqlitePool,
    path: PathBuf,
}

impl StoreHandle {
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Opens (creating if needed) the SQLite store at `path`, tunes it for a
/// single-writer/many-reader workload, and brings it up to the current
/// schema version.
pub async fn open(path: &Path) -> Result<StoreHandle> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(
        path.to_str().ok_or_else(|| Error::Config("database path is not valid UTF-8".into()))?,
    )
    .map_err(|e| Error::Config(format!("invalid database path: {e}")))?
    .create_if_missing(true)
    .journal_mode(SqliteJournalMode::Wal)
    .synchronous(SqliteSynchronous::Normal)
    .shared_cache(true)
    .busy_timeout(Duration::from_secs(5))
    .pragma("foreign_keys", "ON")
    .pragma("cache_size", "-20000")
    .pragma("mmap_size", "268435456")
    .pragma("temp_store", "MEMORY");

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    migrations::migrate(&pool).await?;

    info!(path = %path.display(), "library store ready");

    Ok(StoreHandle {
        pool,
        path: path.to_path_buf(),
    })
}
