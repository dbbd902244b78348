//! Playlist lookup and listing.

use crate::error::Error;
use crate::models::{Playlist, Track};
use crate::query::search::{row_to_track, TRACK_COLUMNS};
use crate::Result;
use sqlx::SqlitePool;

/// Selects a playlist by its stable external id or, failing that, by its
/// display name. External id takes precedence when both would match.
pub enum PlaylistSelector<'a> {
    ExternalId(&'a str),
    Name(&'a str),
}

/// Returns the tracks of the selected playlist, ordered by membership
/// position. An unmatched selector is a [`Error::NotFound`], not an empty
/// list, so callers can distinguish "empty playlist" from "no such
/// playlist".
pub async fn get_playlist_tracks(pool: &SqlitePool, selector: PlaylistSelector<'_>) -> Result<Vec<Track>> {
    let playlist_id = resolve_playlist_id(pool, selector).await?;

    let rows = sqlx::query(&format!(
        "SELECT {TRACK_COLUMNS} FROM playlist_tracks pt \
         JOIN tracks t ON t.id = pt.track_id \
         LEFT JOIN artists ar ON ar.id = t.artist_id \
         LEFT JOIN albums al ON al.id = t.album_id \
         LEFT JOIN genres g ON g.id = t.genre_id \
         WHERE pt.playlist_id = ? \
         ORDER BY pt.position ASC"
    ))
    .bind(playlist_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_track).collect()
}

async fn resolve_playlist_id(pool: &SqlitePool, selector: PlaylistSelector<'_>) -> Result<i64> {
    let found: Option<i64> = match selector {
        PlaylistSelector::ExternalId(id) => {
            sqlx::query_scalar("SELECT id FROM playlists WHERE external_id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        PlaylistSelector::Name(name) => {
            sqlx::query_scalar("SELECT id FROM playlists WHERE LOWER(TRIM(name)) = LOWER(TRIM(?))")
                .bind(name)
                .fetch_optional(pool)
                .await?
        }
    };

    found.ok_or_else(|| Error::NotFound("no playlist matching selector".to_string()))
}

/// Returns every playlist with its cached aggregate fields.
pub async fn list_playlists(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    let rows = sqlx::query_as::<_, Playlist>(
        "SELECT id, external_id, name, special_kind, track_count, genre \
         FROM playlists ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
