//! Smart Spend Persistent Store
//!
//! Keeps named slices of application state in memory and mirrors them into a
//! single versioned envelope in key-value storage:
//! - rehydration runs once per store, at startup
//! - a stale envelope version resets every slice to its seed data
//! - slices still empty after rehydration are seeded by a deferred task
//! - every mutation persists the whole envelope as a detached write

mod envelope;
mod error;
mod slice;
mod store;

pub use error::StoreError;
pub use slice::{fill_if_empty, Record, Slice, StoreState};
pub use store::{
    ErrorHook, PersistHandle, PersistentStore, Rehydration, RehydrationSource, SeedTask,
    StoreOptions, StorePhase,
};

pub type Result<T> = std::result::Result<T, StoreError>;
