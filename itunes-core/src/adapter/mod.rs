//! Automation Adapter: the capability interface the core depends on for
//! everything it cannot do itself — enumerating the Music library, starting
//! playback, and reading current transport state. Per the design's
//! "subprocess scripts as capability interface" note, the subprocess
//! implementation ([`ScriptAdapter`]) is one of many possible providers; a
//! canned test double ([`StubAdapter`]) is another.

pub mod script;
pub mod stub;

pub use script::ScriptAdapter;
pub use stub::StubAdapter;

use crate::models::{NowPlaying, RefreshDump};
use crate::Result;
use async_trait::async_trait;

/// A selector for the `play` operation: exactly the four-way tuple spec
/// §6.1 names. Front-ends decide which one the caller supplied; the
/// adapter just forwards it to the script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayTarget {
    pub playlist: Option<String>,
    pub album: Option<String>,
    pub track: Option<String>,
    pub track_id: Option<String>,
}

/// The three operations the core needs from the Music app, specified by
/// contract only — implementations are opaque to the Query Engine and
/// Ingestion Pipeline.
#[async_trait]
pub trait AutomationAdapter: Send + Sync {
    /// Enumerates the entire library: tracks, playlists, and aggregate
    /// stats, as a single [`RefreshDump`].
    async fn refresh(&self) -> Result<RefreshDump>;

    /// Starts playback of the given target, returning the human-readable
    /// success message the script printed.
    async fn play(&self, target: &PlayTarget) -> Result<String>;

    /// Reads current transport state.
    async fn now_playing(&self) -> Result<NowPlaying>;
}
