//! # itunes-core
//!
//! The library indexing and search engine behind the Music-app control
//! plane: a normalized embedded relational store with a full-text index,
//! the migration/refresh pipeline that keeps it in sync with the Music
//! app's library, and the query surface (ranked text search with
//! structured filters, playlist lookup, statistics) that sits in front of
//! it.
//!
//! Front-ends (a CLI, a stdio tool server) are thin adapters built on top
//! of this crate; see `itunes-cli` and `itunes-mcp`.

pub mod adapter;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod library;
pub mod models;
pub mod query;
pub mod refresh;

pub use error::{Error, Result};
pub use library::Library;
