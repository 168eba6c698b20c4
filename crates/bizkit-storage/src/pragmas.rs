//! Connection pragmas applied on every open.

use rusqlite::Connection;

use bizkit_core::errors::LifecycleResult;

use crate::to_storage_err;

pub fn apply_pragmas(conn: &Connection, busy_timeout_ms: u32) -> LifecycleResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .map_err(to_storage_err)?;
    conn.busy_timeout(std::time::Duration::from_millis(u64::from(busy_timeout_ms)))
        .map_err(to_storage_err)?;
    Ok(())
}
