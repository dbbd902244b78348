//! Row types returned by the query engine and consumed by the ingestion
//! pipeline. These mirror the physical schema in [`crate::db::schema`] but
//! are plain data — no query logic lives here.

use serde::{Deserialize, Serialize};

/// A track with its artist/album/genre names already resolved and its
/// playlist membership denormalized, as returned by the query engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Track {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    #[sqlx(default)]
    pub artist: Option<String>,
    #[sqlx(default)]
    pub album: Option<String>,
    #[sqlx(default)]
    pub genre: Option<String>,
    pub collection: String,
    pub rating: i64,
    pub starred: bool,
    pub ranking: f64,
    pub duration_secs: f64,
    pub play_count: i64,
    pub streaming: bool,
    pub kind: String,
    pub stream_url: Option<String>,
    /// JSON-encoded list of playlist names this track belongs to.
    pub playlist_names: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Track {
    /// Decodes the denormalized [`Self::playlist_names`] column.
    pub fn playlist_names(&self) -> Vec<String> {
        serde_json::from_str(&self.playlist_names).unwrap_or_default()
    }
}

/// A playlist with its cached aggregate fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Playlist {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub special_kind: String,
    pub track_count: i64,
    pub genre: Option<String>,
}

/// Aggregate counts plus on-disk size, as returned by `stats()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub tracks: i64,
    pub playlists: i64,
    pub artists: i64,
    pub albums: i64,
    pub genres: i64,
    pub store_size_bytes: u64,
}

/// One incoming track record from a refresh dump, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackRecord {
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub playlist_names: Vec<String>,
    #[serde(default)]
    pub rating: i64,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub ranking: f64,
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default)]
    pub play_count: i64,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub stream_url: Option<String>,
}

/// One incoming playlist record from a refresh dump.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistRecord {
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub special_kind: String,
    #[serde(default)]
    pub track_count: i64,
    #[serde(default)]
    pub genre: Option<String>,
}

/// Aggregate stats reported by the Automation Adapter alongside a dump.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DumpStats {
    pub total_tracks: i64,
    pub total_playlists: i64,
    pub processing_time_ms: i64,
}

/// The full refresh dump produced by the Automation Adapter's `refresh`
/// operation.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshDump {
    pub status: String,
    pub message: String,
    #[serde(default)]
    pub data: Option<RefreshDumpData>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshDumpData {
    #[serde(default)]
    pub tracks: Vec<TrackRecord>,
    #[serde(default)]
    pub playlists: Vec<PlaylistRecord>,
    #[serde(default)]
    pub stats: DumpStats,
}

/// Current transport state as reported by the Automation Adapter's
/// `now_playing` operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NowPlaying {
    pub status: String,
    #[serde(default)]
    pub track: Option<serde_json::Value>,
    #[serde(default)]
    pub stream: Option<serde_json::Value>,
    pub display: String,
    pub message: String,
}
