//! Command-line surface: maps subcommands onto `itunes-core` operations.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "itunes-cli")]
#[command(author, version, about = "Search and control the macOS Music library")]
pub struct Cli {
    /// Path to the library store (overrides ITUNES_DB_PATH and the default).
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ranked full-text search with optional structured filters.
    Search {
        /// Free-text query; may be empty to browse by the tie-breaker order.
        #[arg(default_value = "")]
        query: String,

        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        album: Option<String>,
        #[arg(long)]
        playlist: Option<String>,
        #[arg(long)]
        starred: Option<bool>,
        #[arg(long)]
        min_rating: Option<i64>,
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Lists the tracks of one playlist, in membership order.
    Playlist {
        /// Playlist external id or display name.
        selector: String,
        /// Treat `selector` as an external id rather than a display name.
        #[arg(long)]
        by_id: bool,
    },

    /// Lists every playlist with its cached track count and genre.
    Playlists,

    /// Prints aggregate counts and store size.
    Stats,

    /// Re-extracts the library from the Music app and ingests it.
    Refresh {
        /// Path to the refresh script.
        #[arg(long, env = "ITUNES_REFRESH_SCRIPT", default_value = "scripts/itunes_refresh.sh")]
        refresh_script: PathBuf,
    },

    /// Starts playback of a playlist, album, track name, or track id.
    Play {
        #[arg(long)]
        playlist: Option<String>,
        #[arg(long)]
        album: Option<String>,
        #[arg(long)]
        track: Option<String>,
        #[arg(long)]
        track_id: Option<String>,
        #[arg(long, env = "ITUNES_PLAY_SCRIPT", default_value = "scripts/itunes_play.sh")]
        play_script: PathBuf,
    },

    /// Prints the current transport state.
    NowPlaying {
        #[arg(
            long,
            env = "ITUNES_NOW_PLAYING_SCRIPT",
            default_value = "scripts/itunes_now_playing.sh"
        )]
        now_playing_script: PathBuf,
    },
}
