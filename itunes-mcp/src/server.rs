//! Tool and resource dispatch: maps each JSON-RPC request onto an
//! `itunes-core` operation.

use crate::rpc::{error_to_rpc, RpcError, CODE_INVALID_PARAMS, CODE_METHOD_NOT_FOUND};
use itunes_core::adapter::{script::ScriptPaths, AutomationAdapter, PlayTarget, ScriptAdapter};
use itunes_core::query::{PlaylistSelector, SearchFilters};
use itunes_core::{Error, Library};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

/// Resolves the three automation script paths from environment variables,
/// with defaults matching `itunes-cli`'s.
fn script_paths() -> ScriptPaths {
    ScriptPaths {
        refresh: env_path("ITUNES_REFRESH_SCRIPT", "scripts/itunes_refresh.sh"),
        play: env_path("ITUNES_PLAY_SCRIPT", "scripts/itunes_play.sh"),
        now_playing: env_path("ITUNES_NOW_PLAYING_SCRIPT", "scripts/itunes_now_playing.sh"),
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

pub struct Server {
    library: Library,
}

impl Server {
    pub fn new(library: Library) -> Self {
        Server { library }
    }

    /// Runs the lookup cache's stale-entry sweep. Called once at startup
    /// and then on an hourly interval from `main`, per the design's
    /// "purged on a background sweep (once per hour) and on startup"
    /// requirement.
    pub fn sweep_cache(&self) {
        self.library.sweep_cache();
    }

    /// The tools this server exposes.
    pub fn list_tools() -> Value {
        json!([
            {"name": "search", "description": "Ranked full-text search with structured filters"},
            {"name": "get_playlist_tracks", "description": "Tracks of a playlist, in membership order"},
            {"name": "list_playlists", "description": "Every playlist with its cached track count and genre"},
            {"name": "stats", "description": "Aggregate counts and store size"},
            {"name": "refresh", "description": "Re-extracts the library from the Music app and ingests it"},
            {"name": "play", "description": "Starts playback of a playlist, album, track, or track id"},
            {"name": "now_playing", "description": "Current transport state"},
        ])
    }

    /// The read-only aggregates this server exposes as resources, per spec
    /// §6.2 / §11.
    pub fn list_resources() -> Value {
        json!([
            {"uri": "itunes://stats", "name": "Library statistics", "mimeType": "application/json"},
            {"uri": "itunes://playlists", "name": "Playlist listing", "mimeType": "application/json"},
            {"uri": "itunes://last-results", "name": "Last search results", "mimeType": "application/json"},
        ])
    }

    pub async fn call_tool(&self, name: &str, params: &Value) -> Result<Value, RpcError> {
        match name {
            "search" => self.tool_search(params).await,
            "get_playlist_tracks" => self.tool_get_playlist_tracks(params).await,
            "list_playlists" => self.tool_list_playlists().await,
            "stats" => self.tool_stats().await,
            "refresh" => self.tool_refresh().await,
            "play" => self.tool_play(params).await,
            "now_playing" => self.tool_now_playing().await,
            other => Err(RpcError {
                code: CODE_METHOD_NOT_FOUND,
                message: format!("unknown tool: {other}"),
                data: None,
            }),
        }
    }

    pub async fn read_resource(&self, uri: &str) -> Result<Value, RpcError> {
        match uri {
            "itunes://stats" => self.tool_stats().await,
            "itunes://playlists" => self.tool_list_playlists().await,
            "itunes://last-results" => self.read_last_results(),
            other => Err(RpcError {
                code: CODE_METHOD_NOT_FOUND,
                message: format!("unknown resource: {other}"),
                data: None,
            }),
        }
    }

    async fn tool_search(&self, params: &Value) -> Result<Value, RpcError> {
        let query = params
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let raw_filters: std::collections::HashMap<String, Value> = params
            .get("filters")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect();

        let mut filters = SearchFilters::from_raw(&raw_filters).map_err(|e| error_to_rpc(&e))?;
        if filters.limit.is_none() {
            filters.limit = Some(self.library.config.search_limit);
        }
        let results = self.library.search(&query, &filters).await.map_err(|e| error_to_rpc(&e))?;

        self.persist_last_results(&results);

        serde_json::to_value(&results).map_err(|e| internal_error(e.to_string()))
    }

    async fn tool_get_playlist_tracks(&self, params: &Value) -> Result<Value, RpcError> {
        let by_id = params.get("external_id").and_then(Value::as_str);
        let by_name = params.get("name").and_then(Value::as_str);

        let selector = match (by_id, by_name) {
            (Some(id), _) => PlaylistSelector::ExternalId(id),
            (None, Some(name)) => PlaylistSelector::Name(name),
            (None, None) => {
                return Err(RpcError {
                    code: CODE_INVALID_PARAMS,
                    message: "get_playlist_tracks requires external_id or name".to_string(),
                    data: None,
                })
            }
        };

        let tracks = self
            .library
            .get_playlist_tracks(selector)
            .await
            .map_err(|e| error_to_rpc(&e))?;

        serde_json::to_value(&tracks).map_err(|e| internal_error(e.to_string()))
    }

    async fn tool_list_playlists(&self) -> Result<Value, RpcError> {
        let playlists = self.library.list_playlists().await.map_err(|e| error_to_rpc(&e))?;
        serde_json::to_value(&playlists).map_err(|e| internal_error(e.to_string()))
    }

    async fn tool_stats(&self) -> Result<Value, RpcError> {
        let stats = self.library.stats().await.map_err(|e| error_to_rpc(&e))?;
        serde_json::to_value(&stats).map_err(|e| internal_error(e.to_string()))
    }

    async fn tool_refresh(&self) -> Result<Value, RpcError> {
        let adapter = ScriptAdapter::new(script_paths());
        let outcome = self.library.refresh(&adapter, None).await.map_err(|e| error_to_rpc(&e))?;
        info!(tracks = outcome.tracks_processed, "refresh complete via tool call");
        serde_json::to_value(&outcome).map_err(|e| internal_error(e.to_string()))
    }

    async fn tool_play(&self, params: &Value) -> Result<Value, RpcError> {
        let adapter = ScriptAdapter::new(script_paths());
        let target = PlayTarget {
            playlist: params.get("playlist").and_then(Value::as_str).map(String::from),
            album: params.get("album").and_then(Value::as_str).map(String::from),
            track: params.get("track").and_then(Value::as_str).map(String::from),
            track_id: params.get("track_id").and_then(Value::as_str).map(String::from),
        };
        let message = adapter.play(&target).await.map_err(|e| error_to_rpc(&e))?;
        Ok(json!({ "message": message }))
    }

    async fn tool_now_playing(&self) -> Result<Value, RpcError> {
        let adapter = ScriptAdapter::new(script_paths());
        let state = adapter.now_playing().await.map_err(|e| error_to_rpc(&e))?;
        serde_json::to_value(&state).map_err(|e| internal_error(e.to_string()))
    }

    fn persist_last_results(&self, results: &[itunes_core::models::Track]) {
        let dir = &self.library.config.cache_dir;
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!(error = %e, "failed to create cache dir for last-results");
            return;
        }
        let path = dir.join("search_results.json");
        match serde_json::to_vec_pretty(results) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(path, bytes) {
                    tracing::warn!(error = %e, "failed to persist last-results");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize last-results"),
        }
    }

    fn read_last_results(&self) -> Result<Value, RpcError> {
        let path = self.library.config.cache_dir.join("search_results.json");
        match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| internal_error(e.to_string())),
            Err(_) => Ok(json!([])),
        }
    }
}

fn internal_error(message: String) -> RpcError {
    error_to_rpc(&Error::Internal(message))
}
