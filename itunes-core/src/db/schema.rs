//! Physical schema DDL
//!
//! This module holds the literal `CREATE TABLE`/`CREATE INDEX`/`CREATE
//! TRIGGER` statements. [`migrations`](crate::db::migrations) decides which
//! of these to run and tracks the applied version; this module only knows
//! how to build a fresh store (v1) and how to evolve it by one step (v2+).

/// Base tables: Artist/Album/Genre are de-duplicated lookup tables; Track
/// and Playlist carry a stable external id; PlaylistTrack is the ordered
/// membership join table.
pub const CREATE_BASE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS artists (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS albums (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS genres (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS tracks (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id     TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    artist_id       INTEGER REFERENCES artists(id),
    album_id        INTEGER REFERENCES albums(id),
    genre_id        INTEGER REFERENCES genres(id),
    collection      TEXT NOT NULL DEFAULT '',
    rating          INTEGER NOT NULL DEFAULT 0 CHECK (rating >= 0 AND rating <= 100),
    starred         INTEGER NOT NULL DEFAULT 0,
    ranking         REAL NOT NULL DEFAULT 0.0 CHECK (ranking >= 0.0 AND ranking <= 1.0),
    duration_secs   REAL NOT NULL DEFAULT 0.0,
    play_count      INTEGER NOT NULL DEFAULT 0,
    streaming       INTEGER NOT NULL DEFAULT 0,
    kind            TEXT NOT NULL DEFAULT '',
    stream_url      TEXT,
    playlist_names  TEXT NOT NULL DEFAULT '[]',
    created_at      TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    modified_at     TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS playlists (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id  TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    special_kind TEXT NOT NULL DEFAULT 'none',
    track_count  INTEGER NOT NULL DEFAULT 0,
    genre        TEXT
);

CREATE TABLE IF NOT EXISTS playlist_tracks (
    playlist_id INTEGER NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
    track_id    INTEGER NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
    position    INTEGER NOT NULL,
    PRIMARY KEY (playlist_id, track_id)
);
"#;

/// External-content FTS5 index over the searchable track fields, plus the
/// triggers that keep it coherent with `tracks`. The index is rebuilt from
/// `tracks` rather than storing its own copy of the text ("external
/// content"), so inserts/updates/deletes on `tracks` must be mirrored here.
pub const CREATE_FTS_INDEX: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS tracks_fts USING fts5(
    name,
    artist,
    album,
    genre,
    collection,
    content='',
    contentless_delete=1
);

CREATE TRIGGER IF NOT EXISTS tracks_ai AFTER INSERT ON tracks BEGIN
    INSERT INTO tracks_fts(rowid, name, artist, album, genre, collection)
    VALUES (
        new.id,
        new.name,
        COALESCE((SELECT name FROM artists WHERE id = new.artist_id), ''),
        COALESCE((SELECT name FROM albums WHERE id = new.album_id), ''),
        COALESCE((SELECT name FROM genres WHERE id = new.genre_id), ''),
        new.collection
    );
END;

CREATE TRIGGER IF NOT EXISTS tracks_ad AFTER DELETE ON tracks BEGIN
    INSERT INTO tracks_fts(tracks_fts, rowid) VALUES ('delete', old.id);
END;

CREATE TRIGGER IF NOT EXISTS tracks_au AFTER UPDATE ON tracks BEGIN
    INSERT INTO tracks_fts(tracks_fts, rowid) VALUES ('delete', old.id);
    INSERT INTO tracks_fts(rowid, name, artist, album, genre, collection)
    VALUES (
        new.id,
        new.name,
        COALESCE((SELECT name FROM artists WHERE id = new.artist_id), ''),
        COALESCE((SELECT name FROM albums WHERE id = new.album_id), ''),
        COALESCE((SELECT name FROM genres WHERE id = new.genre_id), ''),
        new.collection
    );
END;
"#;

/// Secondary indexes named in the design's schema requirements.
pub const CREATE_INDEXES: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_tracks_external_id ON tracks(external_id);
CREATE INDEX IF NOT EXISTS idx_tracks_artist ON tracks(artist_id);
CREATE INDEX IF NOT EXISTS idx_tracks_album ON tracks(album_id);
CREATE INDEX IF NOT EXISTS idx_tracks_genre ON tracks(genre_id);
CREATE INDEX IF NOT EXISTS idx_tracks_starred ON tracks(starred);
CREATE INDEX IF NOT EXISTS idx_tracks_rating ON tracks(rating);
CREATE UNIQUE INDEX IF NOT EXISTS idx_playlists_external_id ON playlists(external_id);
CREATE INDEX IF NOT EXISTS idx_playlist_tracks_position ON playlist_tracks(playlist_id, position);
"#;
