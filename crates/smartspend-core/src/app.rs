//! Application context
//!
//! Built once at process start and handed to every consumer. Owns the
//! database handle and the stores layered over it.

use std::sync::Arc;

use smartspend_storage::{Database, KeyValueStorage, MemoryStorage, SqliteStorage};
use smartspend_store::{Rehydration, RehydrationSource};

use crate::accounts::AccountsStore;
use crate::config::{Config, ACCOUNTS_STORE_KEY};
use crate::Result;

pub struct App {
    /// Configuration
    config: Config,
    /// Embedded database, absent for in-memory sessions
    db: Option<Database>,
    accounts: AccountsStore,
}

impl App {
    /// Open the database named by `config` and wire the stores over it.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        let storage: Arc<dyn KeyValueStorage> = Arc::new(SqliteStorage::new(db.clone()));
        let accounts = AccountsStore::new(storage, config.store_key.clone());

        tracing::info!(path = %config.database_path.display(), "Opened database");

        Ok(Self {
            config,
            db: Some(db),
            accounts,
        })
    }

    /// Session backed by process memory only; nothing survives exit.
    pub fn in_memory() -> Self {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        Self {
            config: Config::default(),
            db: None,
            accounts: AccountsStore::new(storage, ACCOUNTS_STORE_KEY),
        }
    }

    /// Rehydrate every store. Seeding continues in the background; await
    /// [`Rehydration::finish`] to wait for it.
    pub async fn initialize(&self) -> Result<Rehydration> {
        let rehydration = self.accounts.rehydrate().await?;

        match rehydration.source() {
            RehydrationSource::Missing => tracing::info!("Starting with default data"),
            RehydrationSource::Migrated { from } => {
                tracing::warn!(from, "Stored data was from an older schema and has been reset")
            }
            RehydrationSource::Stored => {}
        }

        tracing::info!("App initialized");
        Ok(rehydration)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    pub fn accounts(&self) -> &AccountsStore {
        &self.accounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;
    use smartspend_store::StorePhase;
    use std::path::PathBuf;

    fn temp_config(name: &str) -> Config {
        let dir = std::env::temp_dir().join(format!(
            "smartspend-{}-{}",
            name,
            uuid::Uuid::new_v4()
        ));
        Config::new(dir)
    }

    #[tokio::test]
    async fn test_in_memory_app() {
        let app = App::in_memory();
        assert!(app.database().is_none());

        let rehydration = app.initialize().await.unwrap();
        assert_eq!(app.accounts().phase(), StorePhase::AwaitingSeed);

        rehydration.finish().await.unwrap();
        assert_eq!(app.accounts().currencies(), seed::currencies());
    }

    #[tokio::test]
    async fn test_reopen_from_disk() {
        let config = temp_config("reopen");
        let data_dir: PathBuf = config.database_path.parent().unwrap().to_path_buf();

        {
            let app = App::open(config.clone()).unwrap();
            app.initialize().await.unwrap().finish().await.unwrap();
            app.accounts()
                .set_institutions(seed::institutions()[..1].to_vec())
                .unwrap()
                .wait()
                .await
                .unwrap();
        }

        let app = App::open(config).unwrap();
        let rehydration = app.initialize().await.unwrap();
        assert_eq!(rehydration.source(), RehydrationSource::Stored);
        assert_eq!(app.accounts().institutions().len(), 1);
        assert_eq!(app.accounts().accounts(), seed::accounts());

        drop(app);
        let _ = std::fs::remove_dir_all(data_dir);
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let mut config = temp_config("invalid");
        config.store_key = String::new();
        assert!(App::open(config).is_err());
    }
}
