//! Read-only query surface over the library store.

pub mod filters;
pub mod playlists;
pub mod search;
pub mod stats;

pub use filters::SearchFilters;
pub use playlists::{get_playlist_tracks, list_playlists, PlaylistSelector};
pub use search::search;
pub use stats::stats;
