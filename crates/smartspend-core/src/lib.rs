//! Smart Spend Core
//!
//! Domain records, their default data, and the application context that
//! loads them from local storage at startup.

mod accounts;
mod app;
mod config;
mod error;
mod models;
pub mod seed;

pub use accounts::{
    AccountsState, AccountsStore, ACCOUNTS, ACCOUNTS_STORE_VERSION, CURRENCIES, INSTITUTIONS,
};
pub use app::App;
pub use config::{Config, ACCOUNTS_STORE_KEY, DATABASE_FILE};
pub use error::CoreError;
pub use models::{Account, AccountKind, Currency, Institution, InstitutionKind};

// Re-export the persistence layers
pub use smartspend_storage::{Database, KeyValueStorage, MemoryStorage, SqliteStorage, StorageError};
pub use smartspend_store::{
    PersistHandle, PersistentStore, Rehydration, RehydrationSource, SeedTask, StoreError,
    StorePhase,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
