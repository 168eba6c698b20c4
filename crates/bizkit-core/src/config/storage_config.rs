//! Lifecycle ledger storage configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path. Default: "bizkit.db".
    pub db_path: String,
    /// SQLite busy timeout in milliseconds. Default: 5000.
    pub busy_timeout_ms: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "bizkit.db".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}
