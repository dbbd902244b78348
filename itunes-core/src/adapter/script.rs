//! Subprocess implementation of [`AutomationAdapter`]: shells out to three
//! configurably-pathed scripts and parses their stdout.
//!
//! Spawns each script, collects piped stdout/stderr, and inspects the exit
//! status to distinguish a not-found result from a hard failure.

use super::{AutomationAdapter, PlayTarget};
use crate::error::Error;
use crate::models::{NowPlaying, RefreshDump};
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const DEFAULT_PLAY_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_NOW_PLAYING_TIMEOUT: Duration = Duration::from_secs(10);

/// Paths to the three automation scripts this adapter invokes.
#[derive(Debug, Clone)]
pub struct ScriptPaths {
    pub refresh: PathBuf,
    pub play: PathBuf,
    pub now_playing: PathBuf,
}

pub struct ScriptAdapter {
    paths: ScriptPaths,
    refresh_timeout: Duration,
    play_timeout: Duration,
    now_playing_timeout: Duration,
}

impl ScriptAdapter {
    pub fn new(paths: ScriptPaths) -> Self {
        ScriptAdapter {
            paths,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            play_timeout: DEFAULT_PLAY_TIMEOUT,
            now_playing_timeout: DEFAULT_NOW_PLAYING_TIMEOUT,
        }
    }

    async fn run(&self, path: &PathBuf, args: &[&str], timeout: Duration) -> Result<std::process::Output> {
        let future = Command::new(path)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        match tokio::time::timeout(timeout, future).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(Error::ScriptFailed(format!("failed to launch {}: {e}", path.display()))),
            Err(_) => Err(Error::Timeout(timeout)),
        }
    }

    /// Maps the exit-code-as-error-channel convention to
    /// the core's error taxonomy: 1 = no results, 2 = automation failure,
    /// any other non-zero = unspecified failure (also `ScriptFailed`).
    fn map_exit_code(output: &std::process::Output) -> Option<Error> {
        if output.status.success() {
            return None;
        }
        match output.status.code() {
            Some(1) => Some(Error::NotFound("automation script reported no results".to_string())),
            Some(2) => Some(Error::ScriptFailed("automation script reported a failure".to_string())),
            Some(code) => Some(Error::ScriptFailed(format!("automation script exited with code {code}"))),
            None => Some(Error::ScriptFailed("automation script terminated by signal".to_string())),
        }
    }
}

#[async_trait]
impl AutomationAdapter for ScriptAdapter {
    async fn refresh(&self) -> Result<RefreshDump> {
        let output = self.run(&self.paths.refresh, &[], self.refresh_timeout).await?;

        if let Some(err) = Self::map_exit_code(&output) {
            return Err(err);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .map_err(|e| Error::ScriptFailed(format!("malformed refresh document: {e}")))
    }

    async fn play(&self, target: &PlayTarget) -> Result<String> {
        let mut args: Vec<&str> = Vec::new();
        if let Some(v) = target.playlist.as_deref() {
            args.extend(["--playlist", v]);
        }
        if let Some(v) = target.album.as_deref() {
            args.extend(["--album", v]);
        }
        if let Some(v) = target.track.as_deref() {
            args.extend(["--track", v]);
        }
        if let Some(v) = target.track_id.as_deref() {
            args.extend(["--track-id", v]);
        }

        let output = self.run(&self.paths.play, &args, self.play_timeout).await?;

        if let Some(err) = Self::map_exit_code(&output) {
            return Err(err);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();

        if let Some(message) = trimmed.strip_prefix("OK:") {
            Ok(message.trim().to_string())
        } else if let Some(reason) = trimmed.strip_prefix("ERROR:") {
            Err(Error::ScriptFailed(reason.trim().to_string()))
        } else {
            warn!(stdout = %trimmed, "play script produced unrecognized output");
            Err(Error::ScriptFailed(format!("unrecognized play output: {trimmed}")))
        }
    }

    async fn now_playing(&self) -> Result<NowPlaying> {
        let output = self
            .run(&self.paths.now_playing, &[], self.now_playing_timeout)
            .await?;

        if let Some(err) = Self::map_exit_code(&output) {
            return Err(err);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(bytes = stdout.len(), "now_playing script produced output");
        serde_json::from_str(&stdout)
            .map_err(|e| Error::ScriptFailed(format!("malformed now_playing document: {e}")))
    }
}
