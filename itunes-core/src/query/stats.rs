//! Aggregate counts and store size.

use crate::models::Stats;
use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Returns counts of tracks/playlists/artists/albums/genres and the current
/// on-disk size of the store file (0 if the path is unreadable, e.g. an
/// in-memory store).
pub async fn stats(pool: &SqlitePool, db_path: &Path) -> Result<Stats> {
    let tracks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
        .fetch_one(pool)
        .await?;
    let playlists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM playlists")
        .fetch_one(pool)
        .await?;
    let artists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artists")
        .fetch_one(pool)
        .await?;
    let albums: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM albums")
        .fetch_one(pool)
        .await?;
    let genres: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
        .fetch_one(pool)
        .await?;

    let store_size_bytes = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    Ok(Stats {
        tracks,
        playlists,
        artists,
        albums,
        genres,
        store_size_bytes,
    })
}
