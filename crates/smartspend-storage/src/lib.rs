//! Smart Spend Storage Layer
//!
//! SQLite-backed embedded database plus the asynchronous key-value adapter
//! the persistent store reads and writes through.
//! Reads degrade to "absent" on failure; writes never swallow errors.

mod adapter;
mod database;
mod error;
mod migrations;

pub use adapter::{KeyValueStorage, MemoryStorage, SqliteStorage};
pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
