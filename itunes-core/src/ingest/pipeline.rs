//! Transforms a refresh dump into normalized rows inside a single write
//! transaction.

use super::progress::ProgressReporter;
use crate::models::{PlaylistRecord, RefreshDumpData, TrackRecord};
use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

/// Track records are upserted in batches of this size, bounding how long a
/// single `sqlx` round trip holds the write transaction.
const TRACK_BATCH_SIZE: usize = 500;

/// Outcome of a completed ingestion. `errors` non-empty means the refresh
/// committed but accumulated per-record failures (the `IngestPartial`
/// disposition); it is still a success, not an [`crate::Error`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub tracks_processed: i64,
    pub playlists_processed: i64,
    pub errors: Vec<String>,
}

impl IngestOutcome {
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Runs the full ingestion algorithm for one refresh dump: upserts
/// playlists, upserts tracks in batches (de-duplicating artist/album/genre
/// references), rebuilds playlist membership from the per-track
/// playlist-name lists, commits, then refreshes planner statistics.
///
/// `started_at_unix_ms` is passed in rather than computed here (callers
/// already have a clock; this keeps the pipeline itself deterministic and
/// easy to test).
pub async fn ingest(
    pool: &SqlitePool,
    data: &RefreshDumpData,
    started_at_unix_ms: i64,
    progress_tx: Option<UnboundedSender<super::progress::IngestProgress>>,
) -> Result<IngestOutcome> {
    let mut reporter = ProgressReporter::new(
        progress_tx,
        data.tracks.len() as i64,
        data.playlists.len() as i64,
        started_at_unix_ms,
    );

    let mut tx = pool.begin().await?;

    let mut playlist_ids: HashMap<String, i64> = HashMap::new();
    for playlist in &data.playlists {
        match upsert_playlist(&mut tx, playlist).await {
            Ok(id) => {
                playlist_ids.insert(playlist.name.clone(), id);
            }
            Err(e) => reporter.record_error(format!("playlist {}: {e}", playlist.external_id)),
        }
        reporter.advance_playlist();
    }

    // playlist name (as carried on each track record) -> ordered track
    // external ids, in dump order. Truth for membership; rebuilt below.
    let mut membership: HashMap<String, Vec<String>> = HashMap::new();

    for batch in data.tracks.chunks(TRACK_BATCH_SIZE) {
        for record in batch {
            match upsert_track(&mut tx, record).await {
                Ok(()) => {
                    for name in &record.playlist_names {
                        membership
                            .entry(name.clone())
                            .or_default()
                            .push(record.external_id.clone());
                    }
                }
                Err(e) => reporter.record_error(format!("track {}: {e}", record.external_id)),
            }
            reporter.advance_track();
        }
    }

    // Every playlist in the dump gets its membership replaced, even one
    // with zero member tracks this refresh — otherwise a playlist that
    // lost all its tracks keeps its stale `playlist_tracks` rows from the
    // previous refresh.
    for (name, playlist_id) in &playlist_ids {
        let empty = Vec::new();
        let track_external_ids = membership.get(name).unwrap_or(&empty);
        if let Err(e) = rebuild_playlist_membership(&mut tx, *playlist_id, track_external_ids).await {
            reporter.record_error(format!("playlist membership for {name}: {e}"));
        }
    }

    tx.commit().await?;

    sqlx::query("ANALYZE").execute(pool).await?;

    let final_progress = reporter.finish();
    Ok(IngestOutcome {
        tracks_processed: final_progress.processed_tracks,
        playlists_processed: final_progress.processed_playlists,
        errors: final_progress.errors,
    })
}

async fn upsert_playlist(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    record: &PlaylistRecord,
) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO playlists (external_id, name, special_kind, track_count, genre) \
         VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(external_id) DO UPDATE SET \
            name = excluded.name, \
            special_kind = excluded.special_kind, \
            track_count = excluded.track_count, \
            genre = excluded.genre \
         RETURNING id",
    )
    .bind(&record.external_id)
    .bind(&record.name)
    .bind(if record.special_kind.is_empty() {
        "none"
    } else {
        &record.special_kind
    })
    .bind(record.track_count)
    .bind(&record.genre)
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}

async fn upsert_lookup(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>, table: &str, name: &str) -> Result<i64> {
    let trimmed = name.trim();
    let sql = format!(
        "INSERT INTO {table} (name) VALUES (?) \
         ON CONFLICT(name) DO UPDATE SET name = excluded.name \
         RETURNING id"
    );
    let id: i64 = sqlx::query_scalar(&sql).bind(trimmed).fetch_one(&mut **tx).await?;
    Ok(id)
}

async fn resolve_optional_lookup(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    table: &str,
    name: &str,
) -> Result<Option<i64>> {
    if name.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(upsert_lookup(tx, table, name).await?))
}

fn clamp_rating(rating: i64) -> i64 {
    rating.clamp(0, 100)
}

fn clamp_ranking(ranking: f64) -> f64 {
    ranking.clamp(0.0, 1.0)
}

async fn upsert_track(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>, record: &TrackRecord) -> Result<()> {
    if record.external_id.trim().is_empty() {
        return Err(crate::error::Error::InvalidArgument(
            "track record missing external id".into(),
        ));
    }

    let artist_id = resolve_optional_lookup(tx, "artists", &record.artist).await?;
    let album_id = resolve_optional_lookup(tx, "albums", &record.album).await?;
    let genre_id = resolve_optional_lookup(tx, "genres", &record.genre).await?;

    let playlist_names_json = serde_json::to_string(&record.playlist_names).unwrap_or_else(|_| "[]".to_string());

    sqlx::query(
        "INSERT INTO tracks ( \
            external_id, name, artist_id, album_id, genre_id, collection, \
            rating, starred, ranking, duration_secs, play_count, streaming, \
            kind, stream_url, playlist_names, modified_at \
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP) \
         ON CONFLICT(external_id) DO UPDATE SET \
            name = excluded.name, \
            artist_id = excluded.artist_id, \
            album_id = excluded.album_id, \
            genre_id = excluded.genre_id, \
            collection = excluded.collection, \
            rating = excluded.rating, \
            starred = excluded.starred, \
            ranking = excluded.ranking, \
            duration_secs = excluded.duration_secs, \
            play_count = excluded.play_count, \
            streaming = excluded.streaming, \
            kind = excluded.kind, \
            stream_url = excluded.stream_url, \
            playlist_names = excluded.playlist_names, \
            modified_at = CURRENT_TIMESTAMP",
    )
    .bind(&record.external_id)
    .bind(&record.name)
    .bind(artist_id)
    .bind(album_id)
    .bind(genre_id)
    .bind(&record.collection)
    .bind(clamp_rating(record.rating))
    .bind(record.starred)
    .bind(clamp_ranking(record.ranking))
    .bind(record.duration_secs)
    .bind(record.play_count)
    .bind(record.streaming)
    .bind(&record.kind)
    .bind(&record.stream_url)
    .bind(playlist_names_json)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Replaces a playlist's entire membership with `track_external_ids`, in
/// order, assigning dense `0..n` positions.
async fn rebuild_playlist_membership(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    playlist_id: i64,
    track_external_ids: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM playlist_tracks WHERE playlist_id = ?")
        .bind(playlist_id)
        .execute(&mut **tx)
        .await?;

    for (position, external_id) in track_external_ids.iter().enumerate() {
        let track_id: Option<i64> = sqlx::query_scalar("SELECT id FROM tracks WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&mut **tx)
            .await?;

        let Some(track_id) = track_id else {
            continue;
        };

        sqlx::query(
            "INSERT INTO playlist_tracks (playlist_id, track_id, position) VALUES (?, ?, ?)",
        )
        .bind(playlist_id)
        .bind(track_id)
        .bind(position as i64)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::DumpStats;
    use sqlx::sqlite::SqlitePoolOptions;

    fn sample_dump() -> RefreshDumpData {
        RefreshDumpData {
            tracks: vec![
                TrackRecord {
                    external_id: "T001".into(),
                    name: "Blue in Green".into(),
                    artist: "Miles Davis".into(),
                    genre: "Jazz".into(),
                    playlist_names: vec!["Jazz Favorites".into()],
                    rating: 95,
                    starred: true,
                    ..Default::default()
                },
                TrackRecord {
                    external_id: "T002".into(),
                    name: "So What".into(),
                    artist: "Miles Davis".into(),
                    genre: "Jazz".into(),
                    playlist_names: vec!["Jazz Favorites".into()],
                    rating: 90,
                    ..Default::default()
                },
                TrackRecord {
                    external_id: "T003".into(),
                    name: "Paranoid Android".into(),
                    artist: "Radiohead".into(),
                    playlist_names: vec!["Rock Classics".into(), "Chill Vibes".into()],
                    rating: 88,
                    ..Default::default()
                },
                TrackRecord {
                    external_id: "T004".into(),
                    name: "Karma Police".into(),
                    artist: "Radiohead".into(),
                    playlist_names: vec!["Rock Classics".into(), "Chill Vibes".into()],
                    rating: 80,
                    ..Default::default()
                },
                TrackRecord {
                    external_id: "T005".into(),
                    name: "Weird Fishes".into(),
                    artist: "Radiohead".into(),
                    playlist_names: vec!["Chill Vibes".into()],
                    rating: 85,
                    ..Default::default()
                },
            ],
            playlists: vec![
                PlaylistRecord {
                    external_id: "P001".into(),
                    name: "Jazz Favorites".into(),
                    ..Default::default()
                },
                PlaylistRecord {
                    external_id: "P002".into(),
                    name: "Rock Classics".into(),
                    ..Default::default()
                },
                PlaylistRecord {
                    external_id: "P003".into(),
                    name: "Chill Vibes".into(),
                    ..Default::default()
                },
            ],
            stats: DumpStats::default(),
        }
    }

    async fn fresh_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::migrate(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn ingest_commits_all_tracks_and_playlists() {
        let pool = fresh_pool().await;
        let outcome = ingest(&pool, &sample_dump(), 0, None).await.unwrap();

        assert_eq!(outcome.tracks_processed, 5);
        assert_eq!(outcome.playlists_processed, 3);
        assert!(outcome.errors.is_empty());

        let track_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(track_count, 5);
    }

    #[tokio::test]
    async fn ingest_rebuilds_playlist_membership_in_order() {
        let pool = fresh_pool().await;
        ingest(&pool, &sample_dump(), 0, None).await.unwrap();

        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT t.external_id, pt.position FROM playlist_tracks pt \
             JOIN tracks t ON t.id = pt.track_id \
             JOIN playlists p ON p.id = pt.playlist_id \
             WHERE p.name = 'Chill Vibes' ORDER BY pt.position ASC",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(rows, vec![("T004".to_string(), 0), ("T005".to_string(), 1)]);
    }

    #[tokio::test]
    async fn ingest_deduplicates_artists() {
        let pool = fresh_pool().await;
        ingest(&pool, &sample_dump(), 0, None).await.unwrap();

        let artist_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artists")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(artist_count, 2);
    }

    #[tokio::test]
    async fn repeated_ingest_is_idempotent_at_row_count_level() {
        let pool = fresh_pool().await;
        ingest(&pool, &sample_dump(), 0, None).await.unwrap();
        let first_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
            .fetch_one(&pool)
            .await
            .unwrap();

        ingest(&pool, &sample_dump(), 0, None).await.unwrap();
        let second_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(first_count, second_count);

        let surrogate_id: i64 = sqlx::query_scalar("SELECT id FROM tracks WHERE external_id = 'T001'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(surrogate_id, 1);
    }

    #[tokio::test]
    async fn ratings_outside_range_are_clamped() {
        let pool = fresh_pool().await;
        let mut dump = sample_dump();
        dump.tracks[0].rating = 500;
        dump.tracks[1].rating = -10;
        ingest(&pool, &dump, 0, None).await.unwrap();

        let ratings: Vec<i64> = sqlx::query_scalar(
            "SELECT rating FROM tracks WHERE external_id IN ('T001', 'T002') ORDER BY external_id",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(ratings, vec![100, 0]);
    }

    #[tokio::test]
    async fn missing_external_id_is_accumulated_not_fatal() {
        let pool = fresh_pool().await;
        let mut dump = sample_dump();
        dump.tracks.push(TrackRecord {
            external_id: "".into(),
            name: "Untitled".into(),
            ..Default::default()
        });

        let outcome = ingest(&pool, &dump, 0, None).await.unwrap();
        assert_eq!(outcome.tracks_processed, 6);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.is_partial());
    }
}
