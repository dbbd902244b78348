//! `Library`: the facade front-ends construct once at startup, bundling the
//! open store, the lookup cache, and the refresh controller into a single
//! struct threaded through request handlers instead of passing separate
//! handles around.

use crate::adapter::AutomationAdapter;
use crate::cache::LookupCache;
use crate::config::Config;
use crate::db::{self, StoreHandle};
use crate::error::Error;
use crate::ingest::{progress::IngestProgress, IngestOutcome};
use crate::models::{Playlist, Stats, Track};
use crate::query::{self, PlaylistSelector, SearchFilters};
use crate::refresh::RefreshController;
use crate::Result;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Deadline for a single search or playlist-retrieval call, per the design's
/// ambient deadline contract.
const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Library {
    store: StoreHandle,
    cache: LookupCache,
    refresh: RefreshController,
    pub config: Config,
}

impl Library {
    /// Opens the store at `config.db_path`, migrating it if needed, and
    /// initializes the lookup cache at `config.cache_dir`.
    pub async fn open(config: Config) -> Result<Self> {
        let store = db::open(&config.db_path).await?;
        let cache = LookupCache::init(Some(config.cache_dir.clone()));

        Ok(Library {
            store,
            cache,
            refresh: RefreshController::new(),
            config,
        })
    }

    /// Ranked search, consulting the lookup cache first. Only non-empty
    /// results are cached, and only for non-empty queries — an empty-query
    /// "browse" call always hits the store, since its result set changes
    /// with every refresh.
    pub async fn search(&self, query: &str, filters: &SearchFilters) -> Result<Vec<Track>> {
        let use_cache = !query.trim().is_empty();
        let cache_key = format!("{query}\u{1}{}", filters.cache_digest());

        if use_cache {
            let (results, hit) = self.cache.get(&cache_key);
            if hit {
                return Ok(results);
            }
        }

        let search = query::search(self.store.pool(), query, filters);
        let results = match tokio::time::timeout(QUERY_TIMEOUT, search).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout(QUERY_TIMEOUT)),
        };

        if use_cache {
            self.cache.put(&cache_key, results.clone());
        }

        Ok(results)
    }

    pub async fn get_playlist_tracks(&self, selector: PlaylistSelector<'_>) -> Result<Vec<Track>> {
        let lookup = query::get_playlist_tracks(self.store.pool(), selector);
        match tokio::time::timeout(QUERY_TIMEOUT, lookup).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(QUERY_TIMEOUT)),
        }
    }

    pub async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        query::list_playlists(self.store.pool()).await
    }

    pub async fn stats(&self) -> Result<Stats> {
        query::stats(self.store.pool(), self.store.path()).await
    }

    /// Runs one refresh cycle: extract via `adapter`, ingest into the
    /// store. Fails with `Error::Busy` if a refresh is already running.
    pub async fn refresh(
        &self,
        adapter: &dyn AutomationAdapter,
        progress_tx: Option<UnboundedSender<IngestProgress>>,
    ) -> Result<IngestOutcome> {
        self.refresh.run(self.store.pool(), adapter, progress_tx).await
    }

    pub fn refresh_is_idle(&self) -> bool {
        self.refresh.is_idle()
    }

    pub fn refresh_last_error(&self) -> Option<String> {
        self.refresh.last_error()
    }

    /// Runs the disk cache's stale-entry sweep. Callers schedule this once
    /// an hour, per the design.
    pub fn sweep_cache(&self) {
        self.cache.sweep();
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }
}
