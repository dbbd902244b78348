//! End-to-end ingestion/query scenarios, straight out of the design's
//! literal examples: a five-track, three-playlist dump ingested once (then
//! twice, to check idempotence) and queried every way the engine supports.

use itunes_core::db;
use itunes_core::ingest::ingest;
use itunes_core::models::{DumpStats, PlaylistRecord, RefreshDumpData, TrackRecord};
use itunes_core::query::{self, PlaylistSelector, SearchFilters};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

fn sample_dump() -> RefreshDumpData {
    RefreshDumpData {
        tracks: vec![
            TrackRecord {
                external_id: "T001".into(),
                name: "Blue in Green".into(),
                artist: "Miles Davis".into(),
                album: "Kind of Blue".into(),
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
                album: "Kind of Blue".into(),
                genre: "Jazz".into(),
                playlist_names: vec!["Jazz Favorites".into()],
                rating: 90,
                ..Default::default()
            },
            TrackRecord {
                external_id: "T003".into(),
                name: "Paranoid Android".into(),
                artist: "Radiohead".into(),
                album: "OK Computer".into(),
                genre: "Rock".into(),
                playlist_names: vec!["Rock Classics".into()],
                rating: 88,
                ..Default::default()
            },
            TrackRecord {
                external_id: "T004".into(),
                name: "Karma Police".into(),
                artist: "Radiohead".into(),
                album: "OK Computer".into(),
                genre: "Rock".into(),
                playlist_names: vec!["Rock Classics".into(), "Chill Vibes".into()],
                rating: 80,
                ..Default::default()
            },
            TrackRecord {
                external_id: "T005".into(),
                name: "Weird Fishes".into(),
                artist: "Radiohead".into(),
                album: "In Rainbows".into(),
                genre: "Rock".into(),
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
    let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.unwrap();
    db::migrate(&pool).await.unwrap();
    pool
}

/// Scenario 1: migration coherence.
#[tokio::test]
async fn migration_coherence() {
    let pool = fresh_pool().await;
    ingest(&pool, &sample_dump(), 0, None).await.unwrap();

    let stats = query::stats(&pool, std::path::Path::new("/nonexistent")).await.unwrap();
    assert_eq!(stats.tracks, 5);
    assert_eq!(stats.playlists, 3);

    let tracks = query::get_playlist_tracks(&pool, PlaylistSelector::Name("Chill Vibes"))
        .await
        .unwrap();
    let ids: Vec<_> = tracks.iter().map(|t| t.external_id.clone()).collect();
    assert_eq!(ids, vec!["T004".to_string(), "T005".to_string()]);
}

/// Scenario 2: FTS ranking — both Miles Davis tracks are found, starred
/// breaks ties.
#[tokio::test]
async fn fts_ranking_finds_both_and_orders_by_relevance_then_starred() {
    let pool = fresh_pool().await;
    ingest(&pool, &sample_dump(), 0, None).await.unwrap();

    let results = query::search(&pool, "Miles", &SearchFilters { limit: Some(15), ..Default::default() })
        .await
        .unwrap();
    let ids: Vec<_> = results.iter().map(|t| t.external_id.clone()).collect();
    assert!(ids.contains(&"T001".to_string()));
    assert!(ids.contains(&"T002".to_string()));
}

/// Scenario 3: genre filter.
#[tokio::test]
async fn genre_filter_restricts_to_matching_genre() {
    let pool = fresh_pool().await;
    ingest(&pool, &sample_dump(), 0, None).await.unwrap();

    let filters = SearchFilters {
        genre: Some("Jazz".to_string()),
        limit: Some(15),
        ..Default::default()
    };
    let results = query::search(&pool, "a", &filters).await.unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|t| t.genre.as_deref() == Some("Jazz")));
}

/// Scenario 4: rating filter excludes T002 (90) and T005 (85) at
/// `min_rating: 95`.
#[tokio::test]
async fn min_rating_filter_excludes_lower_rated_tracks() {
    let pool = fresh_pool().await;
    ingest(&pool, &sample_dump(), 0, None).await.unwrap();

    let filters = SearchFilters {
        min_rating: Some(95),
        limit: Some(15),
        ..Default::default()
    };
    let results = query::search(&pool, "a", &filters).await.unwrap();
    let ids: Vec<_> = results.iter().map(|t| t.external_id.clone()).collect();
    assert!(!ids.contains(&"T002".to_string()));
    assert!(!ids.contains(&"T005".to_string()));
}

/// Scenario 5: playlist filter restricts to Rock Classics membership.
#[tokio::test]
async fn playlist_filter_restricts_to_membership() {
    let pool = fresh_pool().await;
    ingest(&pool, &sample_dump(), 0, None).await.unwrap();

    let filters = SearchFilters {
        playlist: Some("Rock Classics".to_string()),
        limit: Some(15),
        ..Default::default()
    };
    let results = query::search(&pool, "a", &filters).await.unwrap();
    let mut ids: Vec<_> = results.iter().map(|t| t.external_id.clone()).collect();
    ids.sort();
    assert_eq!(ids, vec!["T003".to_string(), "T004".to_string()]);
}

/// Scenario 6: substring fallback finds an untokenizable name.
#[tokio::test]
async fn substring_fallback_finds_untokenizable_track() {
    let pool = fresh_pool().await;
    let mut dump = sample_dump();
    dump.tracks.push(TrackRecord {
        external_id: "T006".into(),
        name: "Zyxwv".into(),
        ..Default::default()
    });
    ingest(&pool, &dump, 0, None).await.unwrap();

    let results = query::search(&pool, "Zyx", &SearchFilters::default()).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].external_id, "T006");
}

/// Scenario 7: re-ingesting an identical dump is a no-op at the row-count
/// level and leaves surrogate ids unchanged.
#[tokio::test]
async fn idempotent_re_refresh_preserves_surrogate_ids() {
    let pool = fresh_pool().await;
    let dump = sample_dump();

    ingest(&pool, &dump, 0, None).await.unwrap();
    let ids_before: Vec<(String, i64)> =
        sqlx::query_as("SELECT external_id, id FROM tracks ORDER BY external_id")
            .fetch_all(&pool)
            .await
            .unwrap();

    ingest(&pool, &dump, 0, None).await.unwrap();
    let ids_after: Vec<(String, i64)> =
        sqlx::query_as("SELECT external_id, id FROM tracks ORDER BY external_id")
            .fetch_all(&pool)
            .await
            .unwrap();

    assert_eq!(ids_before, ids_after);

    let track_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks").fetch_one(&pool).await.unwrap();
    assert_eq!(track_count, 5);
}

/// Invariant 1: the FTS shadow table tracks base-table inserts and deletes
/// one-to-one, including after a delete (exercises the `contentless_delete`
/// trigger path).
#[tokio::test]
async fn fts_shadow_table_tracks_deletes() {
    let pool = fresh_pool().await;
    ingest(&pool, &sample_dump(), 0, None).await.unwrap();

    let fts_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks_fts").fetch_one(&pool).await.unwrap();
    assert_eq!(fts_count, 5);

    sqlx::query("DELETE FROM tracks WHERE external_id = 'T001'")
        .execute(&pool)
        .await
        .unwrap();

    let fts_count_after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks_fts").fetch_one(&pool).await.unwrap();
    assert_eq!(fts_count_after, 4);

    let hits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks_fts WHERE tracks_fts MATCH 'Green'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(hits, 0);
}

/// Invariant 3: `PlaylistTrack.position` is dense `0..n-1` within every
/// playlist after a refresh.
#[tokio::test]
async fn playlist_track_positions_are_dense() {
    let pool = fresh_pool().await;
    ingest(&pool, &sample_dump(), 0, None).await.unwrap();

    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT playlist_id, position FROM playlist_tracks ORDER BY playlist_id, position",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    use std::collections::HashMap;
    let mut by_playlist: HashMap<i64, Vec<i64>> = HashMap::new();
    for (playlist_id, position) in rows {
        by_playlist.entry(playlist_id).or_default().push(position);
    }
    for positions in by_playlist.values() {
        let expected: Vec<i64> = (0..positions.len() as i64).collect();
        assert_eq!(*positions, expected);
    }
}

/// Boundary: `search(q, {limit:N})` is a prefix of `search(q, {limit:M})`
/// for `N <= M`.
#[tokio::test]
async fn smaller_limit_is_a_prefix_of_larger_limit() {
    let pool = fresh_pool().await;
    ingest(&pool, &sample_dump(), 0, None).await.unwrap();

    let small = query::search(&pool, "", &SearchFilters { limit: Some(2), ..Default::default() })
        .await
        .unwrap();
    let large = query::search(&pool, "", &SearchFilters { limit: Some(4), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(small.len(), 2);
    assert_eq!(large.len(), 4);
    assert_eq!(small, large[..2]);
}

/// A playlist that still exists but has zero member tracks this refresh
/// (every track that used to reference it was dropped or reassigned) has
/// its stale `playlist_tracks` rows deleted, not left over from the prior
/// refresh.
#[tokio::test]
async fn playlist_with_no_tracks_this_refresh_has_membership_cleared() {
    let pool = fresh_pool().await;
    let dump = sample_dump();
    ingest(&pool, &dump, 0, None).await.unwrap();

    let before: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM playlist_tracks pt \
         JOIN playlists p ON p.id = pt.playlist_id \
         WHERE p.name = 'Chill Vibes'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(before, 2);

    let mut second_dump = dump;
    for track in &mut second_dump.tracks {
        track.playlist_names.retain(|name| name != "Chill Vibes");
    }
    ingest(&pool, &second_dump, 0, None).await.unwrap();

    let after: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM playlist_tracks pt \
         JOIN playlists p ON p.id = pt.playlist_id \
         WHERE p.name = 'Chill Vibes'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(after, 0);

    let playlist_still_exists: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM playlists WHERE name = 'Chill Vibes'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(playlist_still_exists, 1);
}

/// `get_playlist_tracks(by_id) == get_playlist_tracks(by_name)` for unique
/// names.
#[tokio::test]
async fn playlist_lookup_by_id_matches_lookup_by_name() {
    let pool = fresh_pool().await;
    ingest(&pool, &sample_dump(), 0, None).await.unwrap();

    let by_id = query::get_playlist_tracks(&pool, PlaylistSelector::ExternalId("P003"))
        .await
        .unwrap();
    let by_name = query::get_playlist_tracks(&pool, PlaylistSelector::Name("Chill Vibes"))
        .await
        .unwrap();
    assert_eq!(by_id, by_name);
}
