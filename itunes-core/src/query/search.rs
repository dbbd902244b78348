//! Ranked full-text search with structured filters, and its substring
//! fallback.

use super::filters::SearchFilters;
use crate::error::Error;
use crate::models::Track;
use crate::Result;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const DEFAULT_LIMIT: i64 = 15;
const HARD_LIMIT_CAP: i64 = 200;

pub(crate) const TRACK_COLUMNS: &str = r#"
    t.id, t.external_id, t.name,
    ar.name AS artist, al.name AS album, g.name AS genre,
    t.collection, t.rating, t.starred, t.ranking, t.duration_secs,
    t.play_count, t.streaming, t.kind, t.stream_url, t.playlist_names,
    t.created_at, t.modified_at
"#;

/// A query string made up only of whitespace/punctuation is treated as
/// empty, per the search contract.
fn normalize_query(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.chars().all(|c| c.is_whitespace() || c.is_ascii_punctuation()) {
        String::new()
    } else {
        trimmed.to_string()
    }
}

fn resolve_limit(filters: &SearchFilters) -> Result<i64> {
    match filters.limit {
        None => Ok(DEFAULT_LIMIT),
        Some(n) if n < 1 => Err(Error::InvalidArgument(format!("limit must be >= 1, got {n}"))),
        Some(n) => Ok(n.min(HARD_LIMIT_CAP)),
    }
}

/// Appends ` AND ...` filter clauses shared by every search path
/// (FTS, substring fallback, empty query).
fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filters: &SearchFilters) {
    if let Some(genre) = &filters.genre {
        builder
            .push(" AND LOWER(TRIM(COALESCE(g.name, ''))) = ")
            .push_bind(SearchFilters::normalize_exact(genre));
    }
    if let Some(artist) = &filters.artist {
        builder
            .push(" AND LOWER(TRIM(COALESCE(ar.name, ''))) = ")
            .push_bind(SearchFilters::normalize_exact(artist));
    }
    if let Some(album) = &filters.album {
        builder
            .push(" AND LOWER(TRIM(COALESCE(al.name, ''))) = ")
            .push_bind(SearchFilters::normalize_exact(album));
    }
    if let Some(playlist) = &filters.playlist {
        builder.push(
            " AND t.id IN (SELECT pt.track_id FROM playlist_tracks pt \
              JOIN playlists p ON p.id = pt.playlist_id \
              WHERE LOWER(TRIM(p.name)) = ",
        );
        builder.push_bind(SearchFilters::normalize_exact(playlist));
        builder.push(")");
    }
    if let Some(starred) = filters.starred {
        builder.push(" AND t.starred = ").push_bind(starred);
    }
    if let Some(min_rating) = filters.min_rating {
        builder.push(" AND t.rating >= ").push_bind(min_rating);
    }
}

const EMPTY_QUERY_ORDER: &str = " ORDER BY t.starred DESC, t.rating DESC, t.ranking DESC, t.name ASC";
const NONEMPTY_TIEBREAK_ORDER: &str = "t.starred DESC, t.rating DESC, t.ranking DESC, t.name ASC";

async fn run_tracks_query(pool: &SqlitePool, mut builder: QueryBuilder<'_, Sqlite>) -> Result<Vec<Track>> {
    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(row_to_track).collect()
}

pub(crate) fn row_to_track(row: &sqlx::sqlite::SqliteRow) -> Result<Track> {
    Ok(Track {
        id: row.try_get("id")?,
        external_id: row.try_get("external_id")?,
        name: row.try_get("name")?,
        artist: row.try_get("artist")?,
        album: row.try_get("album")?,
        genre: row.try_get("genre")?,
        collection: row.try_get("collection")?,
        rating: row.try_get("rating")?,
        starred: row.try_get("starred")?,
        ranking: row.try_get("ranking")?,
        duration_secs: row.try_get("duration_secs")?,
        play_count: row.try_get("play_count")?,
        streaming: row.try_get("streaming")?,
        kind: row.try_get("kind")?,
        stream_url: row.try_get("stream_url")?,
        playlist_names: row.try_get("playlist_names")?,
        created_at: row.try_get("created_at")?,
        modified_at: row.try_get("modified_at")?,
    })
}

/// Ranked full-text search with optional structured filters. Falls back to
/// a substring match when the FTS path returns nothing for a non-empty
/// query.
pub async fn search(pool: &SqlitePool, query: &str, filters: &SearchFilters) -> Result<Vec<Track>> {
    let limit = resolve_limit(filters)?;
    let normalized = normalize_query(query);

    if normalized.is_empty() {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {TRACK_COLUMNS} FROM tracks t \
             LEFT JOIN artists ar ON ar.id = t.artist_id \
             LEFT JOIN albums al ON al.id = t.album_id \
             LEFT JOIN genres g ON g.id = t.genre_id \
             WHERE 1=1"
        ));
        push_filters(&mut builder, filters);
        builder.push(EMPTY_QUERY_ORDER);
        builder.push(" LIMIT ").push_bind(limit);
        return run_tracks_query(pool, builder).await;
    }

    let fts_pattern = fts5_match_expression(&normalized);
    let mut fts_builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {TRACK_COLUMNS}, bm25(tracks_fts) AS rank FROM tracks_fts \
         JOIN tracks t ON t.id = tracks_fts.rowid \
         LEFT JOIN artists ar ON ar.id = t.artist_id \
         LEFT JOIN albums al ON al.id = t.album_id \
         LEFT JOIN genres g ON g.id = t.genre_id \
         WHERE tracks_fts MATCH "
    ));
    fts_builder.push_bind(fts_pattern);
    fts_builder.push(" AND 1=1");
    push_filters(&mut fts_builder, filters);
    fts_builder.push(format!(" ORDER BY rank ASC, {NONEMPTY_TIEBREAK_ORDER}"));
    fts_builder.push(" LIMIT ").push_bind(limit);

    let fts_results = run_tracks_query(pool, fts_builder).await?;
    if !fts_results.is_empty() {
        return Ok(fts_results);
    }

    let like_pattern = format!("%{}%", normalized.replace('%', "").replace('_', ""));
    let mut like_builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {TRACK_COLUMNS} FROM tracks t \
         LEFT JOIN artists ar ON ar.id = t.artist_id \
         LEFT JOIN albums al ON al.id = t.album_id \
         LEFT JOIN genres g ON g.id = t.genre_id \
         WHERE (t.name LIKE "
    ));
    like_builder.push_bind(like_pattern.clone());
    like_builder.push(" OR COALESCE(ar.name, '') LIKE ");
    like_builder.push_bind(like_pattern.clone());
    like_builder.push(" OR COALESCE(al.name, '') LIKE ");
    like_builder.push_bind(like_pattern.clone());
    like_builder.push(" OR t.collection LIKE ");
    like_builder.push_bind(like_pattern);
    like_builder.push(")");
    push_filters(&mut like_builder, filters);
    like_builder.push(format!(" ORDER BY {NONEMPTY_TIEBREAK_ORDER}"));
    like_builder.push(" LIMIT ").push_bind(limit);

    run_tracks_query(pool, like_builder).await
}

/// Builds a conservative `MATCH` expression: each whitespace-separated term
/// becomes a quoted FTS5 string-literal AND'd together, so punctuation
/// inside a term can't be misread as FTS5 query syntax.
fn fts5_match_expression(normalized: &str) -> String {
    normalized
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" AND ")
}
