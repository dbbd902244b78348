//! Structured filters accepted by `search`.

use crate::error::Error;
use crate::Result;
use std::collections::HashMap;

const RECOGNIZED_KEYS: &[&str] = &[
    "genre",
    "artist",
    "album",
    "playlist",
    "starred",
    "min_rating",
    "limit",
];

/// Recognized filters for [`crate::query::search`]. Constructed directly by
/// library callers, or via [`SearchFilters::from_raw`] at a front-end
/// boundary where filters arrive as an untyped key/value bag (CLI flags,
/// JSON-RPC tool params).
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub playlist: Option<String>,
    pub starred: Option<bool>,
    pub min_rating: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchFilters {
    /// Validates an untyped filter bag and converts it into a
    /// [`SearchFilters`]. Fails with [`Error::InvalidArgument`] on an
    /// unrecognized key or a value of the wrong shape.
    pub fn from_raw(raw: &HashMap<String, serde_json::Value>) -> Result<Self> {
        for key in raw.keys() {
            if !RECOGNIZED_KEYS.contains(&key.as_str()) {
                return Err(Error::InvalidArgument(format!("unknown filter field: {key}")));
            }
        }

        let string_field = |key: &str| -> Result<Option<String>> {
            match raw.get(key) {
                None => Ok(None),
                Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
                Some(_) => Err(Error::InvalidArgument(format!("filter {key} must be a string"))),
            }
        };

        let starred = match raw.get("starred") {
            None => None,
            Some(serde_json::Value::Bool(b)) => Some(*b),
            Some(_) => return Err(Error::InvalidArgument("filter starred must be a boolean".into())),
        };

        let min_rating = match raw.get("min_rating") {
            None => None,
            Some(v) => Some(
                v.as_i64()
                    .ok_or_else(|| Error::InvalidArgument("filter min_rating must be an integer".into()))?,
            ),
        };

        let limit = match raw.get("limit") {
            None => None,
            Some(v) => Some(
                v.as_i64()
                    .ok_or_else(|| Error::InvalidArgument("filter limit must be an integer".into()))?,
            ),
        };

        Ok(SearchFilters {
            genre: string_field("genre")?,
            artist: string_field("artist")?,
            album: string_field("album")?,
            playlist: string_field("playlist")?,
            starred,
            min_rating,
            limit,
        })
    }

    /// Trims and case-folds a value carried as an exact-match filter.
    pub(crate) fn normalize_exact(value: &str) -> String {
        value.trim().to_lowercase()
    }

    /// A canonical string encoding every filter field, used to key the
    /// Lookup Cache alongside the normalized query text — two searches for
    /// the same text but different filters must never collide on one
    /// cache entry.
    pub fn cache_digest(&self) -> String {
        format!(
            "g={}|ar={}|al={}|pl={}|st={:?}|mr={:?}|lim={:?}",
            self.genre.as_deref().map(Self::normalize_exact).unwrap_or_default(),
            self.artist.as_deref().map(Self::normalize_exact).unwrap_or_default(),
            self.album.as_deref().map(Self::normalize_exact).unwrap_or_default(),
            self.playlist.as_deref().map(Self::normalize_exact).unwrap_or_default(),
            self.starred,
            self.min_rating,
            self.limit,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_unknown_key() {
        let mut raw = HashMap::new();
        raw.insert("bogus".to_string(), serde_json::json!("x"));
        let err = SearchFilters::from_raw(&raw).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn from_raw_accepts_recognized_keys() {
        let mut raw = HashMap::new();
        raw.insert("genre".to_string(), serde_json::json!("Jazz"));
        raw.insert("min_rating".to_string(), serde_json::json!(90));
        raw.insert("starred".to_string(), serde_json::json!(true));
        let filters = SearchFilters::from_raw(&raw).unwrap();
        assert_eq!(filters.genre.as_deref(), Some("Jazz"));
        assert_eq!(filters.min_rating, Some(90));
        assert_eq!(filters.starred, Some(true));
    }

    #[test]
    fn from_raw_rejects_wrong_value_type() {
        let mut raw = HashMap::new();
        raw.insert("starred".to_string(), serde_json::json!("yes"));
        let err = SearchFilters::from_raw(&raw).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
