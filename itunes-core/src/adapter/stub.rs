//! In-memory test double for [`AutomationAdapter`]. Returns canned
//! responses configured at construction time; used by `itunes-core`'s own
//! tests and available to front-ends for offline development against a
//! fixed dataset, per the design's capability-interface guidance.

use super::{AutomationAdapter, PlayTarget};
use crate::error::Error;
use crate::models::{NowPlaying, RefreshDump, RefreshDumpData};
use crate::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// What `play` should do the next time it is called. `Ok` yields the
/// adapter's success message; `Err` yields the configured failure.
enum PlayResponse {
    Ok(String),
    NotFound,
    ScriptFailed(String),
}

pub struct StubAdapter {
    dump: RefreshDumpData,
    play_response: Mutex<PlayResponse>,
    now_playing: NowPlaying,
    /// Every `play` call the stub received, for assertions in front-end
    /// tests.
    play_calls: Mutex<Vec<PlayTarget>>,
}

impl StubAdapter {
    pub fn new(dump: RefreshDumpData, now_playing: NowPlaying) -> Self {
        StubAdapter {
            dump,
            play_response: Mutex::new(PlayResponse::Ok("playback started".to_string())),
            now_playing,
            play_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_play_ok(self, message: impl Into<String>) -> Self {
        *self.play_response.lock().unwrap() = PlayResponse::Ok(message.into());
        self
    }

    pub fn with_play_not_found(self) -> Self {
        *self.play_response.lock().unwrap() = PlayResponse::NotFound;
        self
    }

    pub fn with_play_script_failed(self, reason: impl Into<String>) -> Self {
        *self.play_response.lock().unwrap() = PlayResponse::ScriptFailed(reason.into());
        self
    }

    pub fn play_calls(&self) -> Vec<PlayTarget> {
        self.play_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AutomationAdapter for StubAdapter {
    async fn refresh(&self) -> Result<RefreshDump> {
        Ok(RefreshDump {
            status: "success".to_string(),
            message: "ok".to_string(),
            data: Some(self.dump.clone()),
            error: None,
            details: None,
        })
    }

    async fn play(&self, target: &PlayTarget) -> Result<String> {
        self.play_calls.lock().unwrap().push(target.clone());
        match &*self.play_response.lock().unwrap() {
            PlayResponse::Ok(message) => Ok(message.clone()),
            PlayResponse::NotFound => Err(Error::NotFound("no matching track/playlist/album".to_string())),
            PlayResponse::ScriptFailed(reason) => Err(Error::ScriptFailed(reason.clone())),
        }
    }

    async fn now_playing(&self) -> Result<NowPlaying> {
        Ok(self.now_playing.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DumpStats;

    fn empty_dump() -> RefreshDumpData {
        RefreshDumpData {
            tracks: vec![],
            playlists: vec![],
            stats: DumpStats::default(),
        }
    }

    fn playing_state() -> NowPlaying {
        NowPlaying {
            status: "stopped".to_string(),
            track: None,
            stream: None,
            display: "Stopped".to_string(),
            message: "nothing playing".to_string(),
        }
    }

    #[tokio::test]
    async fn refresh_returns_configured_dump() {
        let adapter = StubAdapter::new(empty_dump(), playing_state());
        let dump = adapter.refresh().await.unwrap();
        assert_eq!(dump.status, "success");
    }

    #[tokio::test]
    async fn play_records_call_and_returns_configured_response() {
        let adapter = StubAdapter::new(empty_dump(), playing_state()).with_play_ok("started Jazz Favorites");
        let target = PlayTarget {
            playlist: Some("Jazz Favorites".to_string()),
            ..Default::default()
        };
        let message = adapter.play(&target).await.unwrap();
        assert_eq!(message, "started Jazz Favorites");
        assert_eq!(adapter.play_calls().len(), 1);
    }

    #[tokio::test]
    async fn play_not_found_surfaces_not_found_error() {
        let adapter = StubAdapter::new(empty_dump(), playing_state()).with_play_not_found();
        let err = adapter.play(&PlayTarget::default()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
