//! itunes-cli: thin CLI front-end over `itunes-core`.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use itunes_core::adapter::{script::ScriptPaths, AutomationAdapter, PlayTarget, ScriptAdapter};
use itunes_core::config::Config;
use itunes_core::models::Track;
use itunes_core::query::{PlaylistSelector, SearchFilters};
use itunes_core::{Error, Library};
use std::process::ExitCode;
use tracing::{error, info};

/// Exit codes follow the core error taxonomy: 0 is success, each caller-
/// correctable or environment-level failure kind gets its own code so
/// scripts driving this CLI can branch on it without parsing stderr.
fn exit_code_for(error: &Error) -> u8 {
    match error {
        Error::InvalidArgument(_) => 2,
        Error::NotFound(_) => 3,
        Error::Busy => 4,
        Error::Timeout(_) => 5,
        Error::ScriptFailed(_) => 6,
        Error::Corrupt(_) => 7,
        Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_kinds_get_distinct_exit_codes() {
        let codes = [
            exit_code_for(&Error::InvalidArgument("x".into())),
            exit_code_for(&Error::NotFound("x".into())),
            exit_code_for(&Error::Busy),
            exit_code_for(&Error::Timeout(std::time::Duration::from_secs(1))),
            exit_code_for(&Error::ScriptFailed("x".into())),
            exit_code_for(&Error::Corrupt("x".into())),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
        assert!(codes.iter().all(|c| *c != 0));
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ITUNES_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(core_err) = e.downcast_ref::<Error>() {
                error!(error = %core_err, "command failed");
                ExitCode::from(exit_code_for(core_err))
            } else {
                error!(error = %e, "command failed");
                ExitCode::FAILURE
            }
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let db_path_str = cli.db_path.as_ref().map(|p| p.to_string_lossy().into_owned());
    let config = Config::resolve(db_path_str.as_deref())?;
    let library = Library::open(config).await?;

    // Stale disk-cache entries are purged on startup, per the design's
    // "purged ... on startup" requirement; the CLI is short-lived, so there
    // is no background sweep to schedule here.
    library.sweep_cache();

    match cli.command {
        Commands::Search {
            query,
            genre,
            artist,
            album,
            playlist,
            starred,
            min_rating,
            limit,
        } => {
            let filters = SearchFilters {
                genre,
                artist,
                album,
                playlist,
                starred,
                min_rating,
                limit: limit.or(Some(config.search_limit)),
            };
            let results = library.search(&query, &filters).await?;
            print_tracks(&results);
            persist_last_results(&library, &results)?;
        }

        Commands::Playlist { selector, by_id } => {
            let selector = if by_id {
                PlaylistSelector::ExternalId(&selector)
            } else {
                PlaylistSelector::Name(&selector)
            };
            let tracks = library.get_playlist_tracks(selector).await?;
            print_tracks(&tracks);
        }

        Commands::Playlists => {
            let playlists = library.list_playlists().await?;
            println!("{}", serde_json::to_string_pretty(&playlists)?);
        }

        Commands::Stats => {
            let stats = library.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Refresh { refresh_script } => {
            let adapter = ScriptAdapter::new(ScriptPaths {
                refresh: refresh_script,
                play: "unused".into(),
                now_playing: "unused".into(),
            });
            let outcome = library.refresh(&adapter, None).await?;
            info!(
                tracks = outcome.tracks_processed,
                playlists = outcome.playlists_processed,
                "refresh complete"
            );
            if outcome.is_partial() {
                println!("refresh committed with {} warning(s):", outcome.errors.len());
                for err in &outcome.errors {
                    println!("  - {err}");
                }
            } else {
                println!(
                    "refresh complete: {} tracks, {} playlists",
                    outcome.tracks_processed, outcome.playlists_processed
                );
            }
        }

        Commands::Play {
            playlist,
            album,
            track,
            track_id,
            play_script,
        } => {
            let adapter = ScriptAdapter::new(ScriptPaths {
                refresh: "unused".into(),
                play: play_script,
                now_playing: "unused".into(),
            });
            let target = PlayTarget {
                playlist,
                album,
                track,
                track_id,
            };
            let message = adapter.play(&target).await?;
            println!("{message}");
        }

        Commands::NowPlaying { now_playing_script } => {
            let adapter = ScriptAdapter::new(ScriptPaths {
                refresh: "unused".into(),
                play: "unused".into(),
                now_playing: now_playing_script,
            });
            let state = adapter.now_playing().await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
    }

    Ok(())
}

fn print_tracks(tracks: &[Track]) {
    for track in tracks {
        println!(
            "{:<6} {:<40} {:<20} rating={:<3} starred={}",
            track.external_id,
            track.name,
            track.artist.as_deref().unwrap_or(""),
            track.rating,
            track.starred,
        );
    }
}

/// Writes the cache directory's `search_results.json`, the CLI's record of
/// its own last search, independent of the lookup cache tiers.
fn persist_last_results(library: &Library, results: &[Track]) -> anyhow::Result<()> {
    std::fs::create_dir_all(&library.config.cache_dir)?;
    let path = library.config.cache_dir.join("search_results.json");
    let serialized = serde_json::to_vec_pretty(results)?;
    std::fs::write(path, serialized)?;
    Ok(())
}
