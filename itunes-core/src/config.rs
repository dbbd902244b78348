//! Configuration loading: resolves the store path, backup store path,
//! search result cap, and cache directory.
//!
//! Priority order is CLI arg -> env var -> computed OS-dependent default.
//! There is no project config file tier: these settings have no shared
//! config file to read from; front-ends configure themselves with
//! environment variables alone.

use crate::Result;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "ITUNES_DB_PATH";
pub const ENV_BACKUP_DB_PATH: &str = "ITUNES_BACKUP_DB_PATH";
pub const ENV_SEARCH_LIMIT: &str = "ITUNES_SEARCH_LIMIT";
pub const ENV_CACHE_DIR: &str = "ITUNES_CACHE_DIR";

const DEFAULT_DB_FILENAME: &str = "itunes_library.db";
const DEFAULT_SEARCH_LIMIT: i64 = 15;
const CACHE_SUBFOLDER: &str = "itunes-cache";

/// Resolved runtime configuration for a front-end binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub backup_db_path: Option<PathBuf>,
    pub search_limit: i64,
    pub cache_dir: PathBuf,
}

impl Config {
    /// Resolves configuration from (in priority order) an explicit CLI
    /// argument, then environment variables, falling back to OS-dependent
    /// defaults. `cli_db_path` is the only setting front-ends expose as a
    /// flag today; the rest are environment-only.
    pub fn resolve(cli_db_path: Option<&str>) -> Result<Config> {
        let db_path = resolve_path(cli_db_path, ENV_DB_PATH, default_db_path);
        let backup_db_path = std::env::var(ENV_BACKUP_DB_PATH).ok().map(PathBuf::from);
        let search_limit = resolve_search_limit();
        let cache_dir = resolve_path(None, ENV_CACHE_DIR, default_cache_dir);

        Ok(Config {
            db_path,
            backup_db_path,
            search_limit,
            cache_dir,
        })
    }
}

/// CLI arg -> env var -> computed default.
fn resolve_path(cli_arg: Option<&str>, env_var_name: &str, default: fn() -> PathBuf) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }
    default()
}

/// `ITUNES_SEARCH_LIMIT` must be a positive integer; an unset, empty, or
/// malformed value falls back to the default rather than failing startup.
fn resolve_search_limit() -> i64 {
    std::env::var(ENV_SEARCH_LIMIT)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
}

/// `<user-music-dir>/itunes_library.db`, falling back to the current
/// directory if the platform has no notion of a music directory.
fn default_db_path() -> PathBuf {
    dirs::audio_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DB_FILENAME)
}

/// `<os-temp-dir>/itunes-cache`.
fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join(CACHE_SUBFOLDER)
}
