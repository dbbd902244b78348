//! Database schema migrations
//!
//! Versioned, idempotent migrations tracked via a `schema_version` table.
//! Each migration is safe to re-run: it checks for the table/column/index it
//! would create before creating it, so re-opening a store that is already
//! current is a cheap no-op.
//!
//! # Migration Guidelines
//!
//! 1. Never modify an existing migration once it has shipped — add a new one.
//! 2. Prefer `CREATE ... IF NOT EXISTS` / `pragma_table_info` checks over
//!    assuming a clean slate.
//! 3. Each migration runs in its own transaction; a failure midway must leave
//!    the store at the last successfully applied version, not a partial one.

use super::schema;
use crate::error::Error;
use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version. Bump when adding a new migration.
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Reads the highest applied schema version, or 0 if the store predates
/// version tracking entirely (fresh file, or pre-`schema_version` store).
pub async fn schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Brings the store up to [`CURRENT_SCHEMA_VERSION`], applying only the
/// migrations it is missing, each in its own transaction.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    let current = schema_version(pool).await?;

    if current == CURRENT_SCHEMA_VERSION {
        info!("schema is up to date (v{current})");
        return Ok(());
    }

    if current > CURRENT_SCHEMA_VERSION {
        return Err(Error::Corrupt(format!(
            "store schema version {current} is newer than this binary supports (v{CURRENT_SCHEMA_VERSION})"
        )));
    }

    info!("migrating schema v{current} -> v{CURRENT_SCHEMA_VERSION}");

    if current < 1 {
        run_named_migration(pool, "v1 (base schema)", 1, migrate_v1).await?;
    }

    if current < 2 {
        run_named_migration(pool, "v2 (secondary indexes)", 2, migrate_v2).await?;
    }

    Ok(())
}

/// Runs one migration and names it in any error, so a partial-failure report
/// always says which migration left the store at its last good version.
async fn run_named_migration<'a, F, Fut>(
    pool: &'a SqlitePool,
    label: &'static str,
    version: i32,
    f: F,
) -> Result<()>
where
    F: FnOnce(&'a SqlitePool) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    f(pool).await.map_err(|e| {
        Error::Corrupt(format!("migration {label} failed, store left at last good version: {e}"))
    })?;
    set_schema_version(pool, version)
        .await
        .map_err(|e| Error::Corrupt(format!("migration {label} failed to record version: {e}")))?;
    info!("applied migration {label}");
    Ok(())
}

/// v1: the base tables, the FTS5 index over tracks, and its sync triggers.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::raw_sql(schema::CREATE_BASE_TABLES)
        .execute(&mut *tx)
        .await?;
    sqlx::raw_sql(schema::CREATE_FTS_INDEX)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// v2: secondary indexes. Split out from v1 so a store that already shipped
/// without them can pick them up without a full rebuild.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::raw_sql(schema::CREATE_INDEXES)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}
