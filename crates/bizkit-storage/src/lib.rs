//! # bizkit-storage
//!
//! SQLite persistence for the module lifecycle ledger.
//! WAL mode, one serialized connection, forward-only migrations, and the
//! one-shot migration of the legacy global install flag.

pub mod legacy;
pub mod lifecycle_store;
pub mod migrations;
pub mod pragmas;
pub mod timestamps;

pub use legacy::{LegacyMigrationReport, LEGACY_INSTALLED_AT_KEY};
pub use lifecycle_store::{ModuleEventRow, SqliteLifecycleStore};

use bizkit_core::errors::LifecycleError;

/// Wrap any storage-level failure as `LifecycleError::Storage`.
pub fn to_storage_err(e: impl std::fmt::Display) -> LifecycleError {
    LifecycleError::Storage {
        message: e.to_string(),
    }
}
