//! Asynchronous key-value adapter
//!
//! Uniform `get_item` / `set_item` / `remove_item` contract over string keys
//! and string values. Failure policy:
//! - reads log the error and report the key as absent
//! - writes and removals log the error and return it to the caller

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::database::Database;
use crate::Result;

#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Value stored under `key`, or `None` when absent or unreadable.
    async fn get_item(&self, key: &str) -> Option<String>;

    /// Insert or replace the value stored under `key`.
    async fn set_item(&self, key: &str, value: String) -> Result<()>;

    /// Delete `key` if present.
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// Adapter over the embedded SQLite database.
///
/// No caching: every call is a round trip on the blocking pool.
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }
}

#[async_trait]
impl KeyValueStorage for SqliteStorage {
    async fn get_item(&self, key: &str) -> Option<String> {
        let owned = key.to_string();
        match self.run(move |db| db.get_item(&owned)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Error getting item from storage");
                None
            }
        }
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        let owned = key.to_string();
        self.run(move |db| db.put_item(&owned, &value))
            .await
            .inspect_err(|e| {
                tracing::error!(key = %key, error = %e, "Error setting item in storage");
            })
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let owned = key.to_string();
        let removed = self
            .run(move |db| db.delete_item(&owned))
            .await
            .inspect_err(|e| {
                tracing::error!(key = %key, error = %e, "Error removing item from storage");
            })?;

        if removed {
            tracing::debug!(key = %key, "Removed item from storage");
        }
        Ok(())
    }
}

impl Clone for SqliteStorage {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

/// In-process adapter for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        self.items.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().remove(key);
        Ok(())
    }
}

impl Clone for MemoryStorage {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}
