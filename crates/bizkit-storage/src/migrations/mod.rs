//! Schema migrations for the lifecycle ledger.
//!
//! Applied versions are recorded in `schema_version`. Migrations only move
//! forward, and each one commits together with its version row.

mod v001_lifecycle_tables;
mod v002_module_events;

use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info, warn};

use bizkit_core::errors::{LifecycleError, LifecycleResult};

use crate::to_storage_err;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "lifecycle_tables",
        sql: v001_lifecycle_tables::SQL,
    },
    Migration {
        version: 2,
        name: "module_events",
        sql: v002_module_events::SQL,
    },
];

/// Highest version this build knows how to create.
pub const LATEST_VERSION: u32 = 2;

const VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
) STRICT;";

/// Highest applied version, 0 for a database that was never migrated.
pub fn current_version(conn: &Connection) -> LifecycleResult<u32> {
    let version: Option<u32> = conn
        .query_row(
            "SELECT MAX(version) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .or_else(|e| match e {
            // No version table yet.
            rusqlite::Error::SqliteFailure(_, Some(ref msg)) if msg.contains("no such table") => {
                Ok(None)
            }
            other => Err(other),
        })
        .map_err(to_storage_err)?;
    Ok(version.unwrap_or(0))
}

/// Bring the schema to `LATEST_VERSION`. Returns the number of migrations applied.
pub fn run_migrations(conn: &mut Connection) -> LifecycleResult<u32> {
    conn.execute_batch(VERSION_TABLE).map_err(to_storage_err)?;

    let from = current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        debug!(version = from, "lifecycle schema current");
        return Ok(0);
    }

    info!(from, to = LATEST_VERSION, "migrating lifecycle schema");
    for migration in &pending {
        apply(conn, migration).map_err(|e| {
            warn!(version = migration.version, name = migration.name, error = %e, "migration rolled back");
            LifecycleError::MigrationFailed {
                version: migration.version,
                message: e.to_string(),
            }
        })?;
        debug!(version = migration.version, name = migration.name, "migration applied");
    }
    Ok(pending.len() as u32)
}

fn apply(conn: &mut Connection, migration: &Migration) -> rusqlite::Result<()> {
    // Immediate: take the write lock up front so two processes opening the
    // same file cannot both start the same migration.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(migration.sql)?;
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [migration.version],
    )?;
    tx.commit()
}
