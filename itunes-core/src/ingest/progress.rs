//! Progress reporting for a running ingestion.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

const MIN_EMIT_INTERVAL: Duration = Duration::from_secs(1);
const MAX_ACCUMULATED_ERRORS: usize = 100;

/// A snapshot of ingestion progress, emitted synchronously at most once per
/// second and once at completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestProgress {
    pub total_tracks: i64,
    pub processed_tracks: i64,
    pub total_playlists: i64,
    pub processed_playlists: i64,
    /// Milliseconds since the UNIX epoch; set once at ingestion start.
    pub started_at_unix_ms: i64,
    /// Per-record failures accumulated so far; bounded, does not abort the
    /// batch.
    pub errors: Vec<String>,
}

/// Throttles progress emission to at most once per second, plus a final
/// unconditional emission at completion.
pub struct ProgressReporter {
    tx: Option<UnboundedSender<IngestProgress>>,
    last_emit: Instant,
    state: IngestProgress,
}

impl ProgressReporter {
    pub fn new(
        tx: Option<UnboundedSender<IngestProgress>>,
        total_tracks: i64,
        total_playlists: i64,
        started_at_unix_ms: i64,
    ) -> Self {
        ProgressReporter {
            tx,
            // Force the first `maybe_emit` call through regardless of timing.
            last_emit: Instant::now() - MIN_EMIT_INTERVAL,
            state: IngestProgress {
                total_tracks,
                total_playlists,
                started_at_unix_ms,
                ..Default::default()
            },
        }
    }

    pub fn record_error(&mut self, message: String) {
        if self.state.errors.len() < MAX_ACCUMULATED_ERRORS {
            self.state.errors.push(message);
        }
    }

    pub fn advance_track(&mut self) {
        self.state.processed_tracks += 1;
        self.maybe_emit();
    }

    pub fn advance_playlist(&mut self) {
        self.state.processed_playlists += 1;
        self.maybe_emit();
    }

    fn maybe_emit(&mut self) {
        if self.last_emit.elapsed() >= MIN_EMIT_INTERVAL {
            self.emit();
        }
    }

    /// Unconditional emission, used for the final progress event.
    pub fn finish(mut self) -> IngestProgress {
        self.emit();
        self.state
    }

    fn emit(&mut self) {
        self.last_emit = Instant::now();
        if let Some(tx) = &self.tx {
            let _ = tx.send(self.state.clone());
        }
    }
}
