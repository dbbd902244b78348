//! The refresh lifecycle state machine: `Idle -> Extracting -> Ingesting ->
//! Idle`, with a `Failed` state on either leg's failure. Only
//! one refresh may be in flight; a concurrent request fails with `Busy`
//! rather than queuing.

use crate::adapter::AutomationAdapter;
use crate::error::Error;
use crate::ingest::{self, progress::IngestProgress, IngestOutcome};
use crate::Result;
use sqlx::SqlitePool;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Extracting,
    Ingesting,
    Failed,
}

/// Owns the refresh lifecycle for one library store. Cheap to construct;
/// holds only a small mutex-guarded state enum plus the last error message,
/// not the store handle itself.
pub struct RefreshController {
    state: Mutex<State>,
    last_error: Mutex<Option<String>>,
}

impl Default for RefreshController {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshController {
    pub fn new() -> Self {
        RefreshController {
            state: Mutex::new(State::Idle),
            last_error: Mutex::new(None),
        }
    }

    /// The last error recorded by a failed refresh, if the controller has
    /// ever entered the `Failed` state.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    pub fn is_idle(&self) -> bool {
        *self.state.lock().unwrap() == State::Idle
    }

    /// Extracts a fresh dump via `adapter` and ingests it into `pool`.
    /// Fails immediately with [`Error::Busy`] if a refresh is already
    /// `Extracting` or `Ingesting`. On success the controller returns to
    /// `Idle` automatically; on any failure it moves to `Failed`, retaining
    /// the prior committed store content (the ingestion transaction rolls
    /// back on its own error) and recording the failure for `last_error`.
    pub async fn run(
        &self,
        pool: &SqlitePool,
        adapter: &dyn AutomationAdapter,
        progress_tx: Option<UnboundedSender<IngestProgress>>,
    ) -> Result<IngestOutcome> {
        self.enter_extracting()?;

        let started_at_unix_ms = now_unix_ms();

        let dump = match adapter.refresh().await {
            Ok(dump) => dump,
            Err(e) => {
                self.fail(format!("extraction failed: {e}"));
                return Err(e);
            }
        };

        if dump.status != "success" {
            let message = dump.error.clone().unwrap_or(dump.message);
            self.fail(format!("extraction reported failure: {message}"));
            return Err(Error::ScriptFailed(message));
        }

        let Some(data) = dump.data else {
            let message = "refresh dump reported success but carried no data".to_string();
            self.fail(message.clone());
            return Err(Error::ScriptFailed(message));
        };

        self.enter_ingesting();

        match ingest::ingest(pool, &data, started_at_unix_ms, progress_tx).await {
            Ok(outcome) => {
                self.enter_idle();
                info!(
                    tracks = outcome.tracks_processed,
                    playlists = outcome.playlists_processed,
                    errors = outcome.errors.len(),
                    "refresh committed"
                );
                Ok(outcome)
            }
            Err(e) => {
                self.fail(format!("ingestion failed: {e}"));
                Err(e)
            }
        }
    }

    fn enter_extracting(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if *state != State::Idle && *state != State::Failed {
            return Err(Error::Busy);
        }
        *state = State::Extracting;
        Ok(())
    }

    fn enter_ingesting(&self) {
        *self.state.lock().unwrap() = State::Ingesting;
    }

    fn enter_idle(&self) {
        *self.state.lock().unwrap() = State::Idle;
        *self.last_error.lock().unwrap() = None;
    }

    fn fail(&self, message: String) {
        error!(error = %message, "refresh failed");
        *self.state.lock().unwrap() = State::Failed;
        *self.last_error.lock().unwrap() = Some(message);
    }
}

fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StubAdapter;
    use crate::db;
    use crate::models::{DumpStats, NowPlaying, RefreshDumpData, TrackRecord};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn fresh_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::migrate(&pool).await.unwrap();
        pool
    }

    fn idle_now_playing() -> NowPlaying {
        NowPlaying {
            status: "stopped".to_string(),
            track: None,
            stream: None,
            display: "Stopped".to_string(),
            message: "nothing playing".to_string(),
        }
    }

    #[tokio::test]
    async fn successful_refresh_returns_to_idle() {
        let pool = fresh_pool().await;
        let dump = RefreshDumpData {
            tracks: vec![TrackRecord {
                external_id: "T001".into(),
                name: "Blue in Green".into(),
                ..Default::default()
            }],
            playlists: vec![],
            stats: DumpStats::default(),
        };
        let adapter = StubAdapter::new(dump, idle_now_playing());
        let controller = RefreshController::new();

        let outcome = controller.run(&pool, &adapter, None).await.unwrap();
        assert_eq!(outcome.tracks_processed, 1);
        assert!(controller.is_idle());
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn concurrent_refresh_is_rejected_as_busy() {
        let controller = RefreshController::new();
        controller.enter_extracting().unwrap();

        let pool = fresh_pool().await;
        let adapter = StubAdapter::new(RefreshDumpData::default(), idle_now_playing());
        let err = controller.run(&pool, &adapter, None).await.unwrap_err();
        assert!(matches!(err, Error::Busy));
    }

    #[tokio::test]
    async fn failed_extraction_moves_to_failed_and_records_error() {
        struct FailingAdapter;
        #[async_trait::async_trait]
        impl AutomationAdapter for FailingAdapter {
            async fn refresh(&self) -> Result<crate::models::RefreshDump> {
                Err(Error::ScriptFailed("boom".to_string()))
            }
            async fn play(&self, _target: &crate::adapter::PlayTarget) -> Result<String> {
                unimplemented!()
            }
            async fn now_playing(&self) -> Result<NowPlaying> {
                unimplemented!()
            }
        }

        let pool = fresh_pool().await;
        let controller = RefreshController::new();
        let err = controller.run(&pool, &FailingAdapter, None).await.unwrap_err();
        assert!(matches!(err, Error::ScriptFailed(_)));
        assert!(!controller.is_idle());
        assert!(controller.last_error().is_some());
    }

    #[tokio::test]
    async fn a_refresh_after_a_failure_is_allowed_and_can_recover() {
        let pool = fresh_pool().await;
        let controller = RefreshController::new();
        controller.fail("previous failure".to_string());

        let dump = RefreshDumpData::default();
        let adapter = StubAdapter::new(dump, idle_now_playing());
        let outcome = controller.run(&pool, &adapter, None).await.unwrap();
        assert_eq!(outcome.tracks_processed, 0);
        assert!(controller.is_idle());
    }
}
