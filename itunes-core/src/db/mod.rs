//! Store initialization, schema, and migrations

pub mod init;
pub mod migrations;
pub mod schema;

pub use init::{open, StoreHandle};
pub use migrations::{migrate, schema_version};
