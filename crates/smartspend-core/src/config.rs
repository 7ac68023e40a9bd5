//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::Result;

/// File name of the embedded database inside the data directory.
pub const DATABASE_FILE: &str = "SmartSpendAI_DB.sqlite3";

/// Storage key of the accounts envelope.
pub const ACCOUNTS_STORE_KEY: &str = "accounts-store";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Key the accounts envelope is stored under
    #[serde(default = "default_store_key")]
    pub store_key: String,
}

fn default_store_key() -> String {
    ACCOUNTS_STORE_KEY.to_string()
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join(DATABASE_FILE),
            store_key: default_store_key(),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("SmartSpendAI"))
            .unwrap_or_else(|| PathBuf::from(".smartspend"))
    }

    /// Read a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_key.trim().is_empty() {
            return Err(CoreError::Config("store_key cannot be empty".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(CoreError::Config("database_path cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
