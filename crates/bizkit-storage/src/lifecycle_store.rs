//! `SqliteLifecycleStore` — the durable `LifecycleStore` backend.
//!
//! One connection behind a `Mutex`: ledger writes are rare and human
//! triggered, so serializing them costs nothing. Every transition runs in a
//! single transaction that writes the lifecycle row and its `module_events`
//! entry together.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::Serialize;
use tracing::{debug, info};

use bizkit_core::audit::{record_best_effort, AuditEvent, AuditSink, TracingAuditSink};
use bizkit_core::clock::{Clock, SystemClock};
use bizkit_core::config::StorageConfig;
use bizkit_core::errors::{LifecycleError, LifecycleResult};
use bizkit_core::lifecycle::{LifecycleStore, ModuleLifecycleRecord, ModuleStatus};
use bizkit_core::manifest::is_valid_slug;

use crate::migrations::run_migrations;
use crate::pragmas::apply_pragmas;
use crate::timestamps::{format_ts, normalize, parse_ts};
use crate::to_storage_err;

const RECORD_COLUMNS: &str = "slug, status, installed_at, activated_at, deactivated_at, \
                              deactivated_by, updated_at";

/// One row of the `module_events` audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleEventRow {
    pub id: i64,
    pub slug: String,
    pub event_type: String,
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct SqliteLifecycleStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
}

impl SqliteLifecycleStore {
    /// Open (or create) a file-backed ledger and bring its schema up to date.
    pub fn open(path: &Path) -> LifecycleResult<Self> {
        Self::open_with_timeout(path, 5000)
    }

    pub fn open_with_timeout(path: &Path, busy_timeout_ms: u32) -> LifecycleResult<Self> {
        let conn = Connection::open(path).map_err(to_storage_err)?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        info!(path = %path.display(), "opened lifecycle ledger");
        Self::init(conn)
    }

    /// Ephemeral ledger, gone when the store is dropped.
    pub fn open_in_memory() -> LifecycleResult<Self> {
        let conn = Connection::open_in_memory().map_err(to_storage_err)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(to_storage_err)?;
        Self::init(conn)
    }

    pub fn from_config(config: &StorageConfig) -> LifecycleResult<Self> {
        Self::open_with_timeout(Path::new(&config.db_path), config.busy_timeout_ms)
    }

    fn init(mut conn: Connection) -> LifecycleResult<Self> {
        run_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
            audit: Arc::new(TracingAuditSink),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Audit trail for one slug, newest first.
    pub fn module_events(&self, slug: &str, limit: usize) -> LifecycleResult<Vec<ModuleEventRow>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, slug, event_type, actor, created_at FROM module_events
                 WHERE slug = ?1 ORDER BY id DESC LIMIT ?2",
            )
            .map_err(to_storage_err)?;
        let rows = stmt
            .query_map(params![slug, limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(to_storage_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_storage_err)?;

        rows.into_iter()
            .map(|(id, slug, event_type, actor, created_at)| {
                let created_at = parse_ts(&created_at).ok_or_else(|| LifecycleError::CorruptRecord {
                    slug: slug.clone(),
                    message: format!("bad event timestamp '{created_at}'"),
                })?;
                Ok(ModuleEventRow {
                    id,
                    slug,
                    event_type,
                    actor,
                    created_at,
                })
            })
            .collect()
    }

    /// Run `f` with the underlying connection. For admin tooling and tests.
    pub fn with_connection<T, F>(&self, f: F) -> LifecycleResult<T>
    where
        F: FnOnce(&mut Connection) -> LifecycleResult<T>,
    {
        let mut conn = self.lock();
        f(&mut conn)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        // SQLite rolls back any transaction left open by a panicking holder.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        normalize(self.clock.now())
    }

    pub(crate) fn audit(&self) -> &dyn AuditSink {
        self.audit.as_ref()
    }

    fn check_slug(slug: &str) -> LifecycleResult<()> {
        if is_valid_slug(slug) {
            Ok(())
        } else {
            Err(LifecycleError::InvalidSlug {
                slug: slug.to_string(),
            })
        }
    }
}

// ─── row helpers ────────────────────────────────────────────────────

struct RawRecord {
    slug: String,
    status: String,
    installed_at: String,
    activated_at: Option<String>,
    deactivated_at: Option<String>,
    deactivated_by: Option<String>,
    updated_at: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            slug: row.get(0)?,
            status: row.get(1)?,
            installed_at: row.get(2)?,
            activated_at: row.get(3)?,
            deactivated_at: row.get(4)?,
            deactivated_by: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_record(self) -> LifecycleResult<ModuleLifecycleRecord> {
        let slug = self.slug;
        let corrupt = |message: String| LifecycleError::CorruptRecord {
            slug: slug.clone(),
            message,
        };
        let ts = |value: &str| {
            parse_ts(value).ok_or_else(|| corrupt(format!("bad timestamp '{value}'")))
        };
        let opt_ts = |value: Option<&str>| value.map(ts).transpose();

        let status = self.status.parse::<ModuleStatus>().map_err(corrupt)?;
        let installed_at = ts(&self.installed_at)?;
        let activated_at = opt_ts(self.activated_at.as_deref())?;
        let deactivated_at = opt_ts(self.deactivated_at.as_deref())?;
        let updated_at = ts(&self.updated_at)?;

        Ok(ModuleLifecycleRecord {
            slug: slug.clone(),
            status,
            installed_at,
            activated_at,
            deactivated_at,
            deactivated_by: self.deactivated_by,
            updated_at,
        })
    }
}

fn select_record(conn: &Connection, slug: &str) -> LifecycleResult<Option<ModuleLifecycleRecord>> {
    let raw = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM module_lifecycle WHERE slug = ?1"),
            [slug],
            RawRecord::from_row,
        )
        .optional()
        .map_err(to_storage_err)?;
    raw.map(RawRecord::into_record).transpose()
}

fn select_slugs(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> LifecycleResult<BTreeSet<String>> {
    let mut stmt = conn.prepare(sql).map_err(to_storage_err)?;
    let slugs = stmt
        .query_map(args, |row| row.get::<_, String>(0))
        .map_err(to_storage_err)?
        .collect::<Result<BTreeSet<_>, _>>()
        .map_err(to_storage_err)?;
    Ok(slugs)
}

/// Insert a record unless one exists. `true` when a row was created.
pub(crate) fn insert_if_missing(
    tx: &Transaction<'_>,
    slug: &str,
    installed_at: &str,
    status: ModuleStatus,
    activated_at: Option<&str>,
    updated_at: &str,
) -> LifecycleResult<bool> {
    let changed = tx
        .execute(
            "INSERT INTO module_lifecycle (slug, status, installed_at, activated_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(slug) DO NOTHING",
            params![slug, status.as_str(), installed_at, activated_at, updated_at],
        )
        .map_err(to_storage_err)?;
    Ok(changed == 1)
}

pub(crate) fn insert_event(
    tx: &Transaction<'_>,
    slug: &str,
    event_type: &str,
    actor: Option<&str>,
    created_at: &str,
) -> LifecycleResult<()> {
    tx.execute(
        "INSERT INTO module_events (slug, event_type, actor, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![slug, event_type, actor, created_at],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

fn record_after_write(tx: &Transaction<'_>, slug: &str) -> LifecycleResult<ModuleLifecycleRecord> {
    select_record(tx, slug)?.ok_or_else(|| LifecycleError::Storage {
        message: format!("record for '{slug}' vanished inside its own transaction"),
    })
}

// ─── LifecycleStore ─────────────────────────────────────────────────

impl LifecycleStore for SqliteLifecycleStore {
    fn install(&self, slug: &str) -> LifecycleResult<bool> {
        Self::check_slug(slug)?;
        let now = self.now();
        let at = format_ts(now);

        let created = {
            let mut conn = self.lock();
            let tx = conn.transaction().map_err(to_storage_err)?;
            let created = insert_if_missing(&tx, slug, &at, ModuleStatus::Inactive, None, &at)?;
            if created {
                insert_event(&tx, slug, "installed", None, &at)?;
            }
            tx.commit().map_err(to_storage_err)?;
            created
        };

        if created {
            debug!(slug, "module installed");
            record_best_effort(
                self.audit(),
                &AuditEvent::Installed {
                    slug: slug.to_string(),
                    at: now,
                },
            );
        }
        Ok(created)
    }

    fn activate(&self, slug: &str, actor: Option<&str>) -> LifecycleResult<ModuleLifecycleRecord> {
        Self::check_slug(slug)?;
        let now = self.now();
        let at = format_ts(now);

        let (record, created) = {
            let mut conn = self.lock();
            let tx = conn.transaction().map_err(to_storage_err)?;
            let created = insert_if_missing(&tx, slug, &at, ModuleStatus::Inactive, None, &at)?;
            if created {
                insert_event(&tx, slug, "installed", None, &at)?;
            }
            tx.execute(
                "UPDATE module_lifecycle
                 SET status = 'active', activated_at = ?2, deactivated_at = NULL,
                     deactivated_by = NULL, updated_at = ?2
                 WHERE slug = ?1",
                params![slug, at],
            )
            .map_err(to_storage_err)?;
            insert_event(&tx, slug, "activated", actor, &at)?;
            let record = record_after_write(&tx, slug)?;
            tx.commit().map_err(to_storage_err)?;
            (record, created)
        };

        if created {
            record_best_effort(
                self.audit(),
                &AuditEvent::Installed {
                    slug: slug.to_string(),
                    at: now,
                },
            );
        }
        record_best_effort(
            self.audit(),
            &AuditEvent::Activated {
                slug: slug.to_string(),
                actor: actor.map(str::to_string),
                at: now,
            },
        );
        Ok(record)
    }

    fn deactivate(
        &self,
        slug: &str,
        actor: Option<&str>,
    ) -> LifecycleResult<ModuleLifecycleRecord> {
        let now = self.now();
        let at = format_ts(now);

        let record = {
            let mut conn = self.lock();
            let tx = conn.transaction().map_err(to_storage_err)?;
            let changed = tx
                .execute(
                    "UPDATE module_lifecycle
                     SET status = 'inactive', deactivated_at = ?2, deactivated_by = ?3,
                         updated_at = ?2
                     WHERE slug = ?1",
                    params![slug, at, actor],
                )
                .map_err(to_storage_err)?;
            if changed == 0 {
                return Err(LifecycleError::NotInstalled {
                    slug: slug.to_string(),
                });
            }
            insert_event(&tx, slug, "deactivated", actor, &at)?;
            let record = record_after_write(&tx, slug)?;
            tx.commit().map_err(to_storage_err)?;
            record
        };

        record_best_effort(
            self.audit(),
            &AuditEvent::Deactivated {
                slug: slug.to_string(),
                actor: actor.map(str::to_string),
                at: now,
            },
        );
        Ok(record)
    }

    fn get(&self, slug: &str) -> LifecycleResult<Option<ModuleLifecycleRecord>> {
        select_record(&self.lock(), slug)
    }

    fn list_records(&self) -> LifecycleResult<Vec<ModuleLifecycleRecord>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM module_lifecycle ORDER BY slug"
            ))
            .map_err(to_storage_err)?;
        let raws = stmt
            .query_map([], RawRecord::from_row)
            .map_err(to_storage_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_storage_err)?;
        raws.into_iter().map(RawRecord::into_record).collect()
    }

    fn list_active_slugs(&self) -> LifecycleResult<BTreeSet<String>> {
        select_slugs(
            &self.lock(),
            "SELECT slug FROM module_lifecycle WHERE status = 'active'",
            params![],
        )
    }

    fn list_inactive_since(&self, threshold: DateTime<Utc>) -> LifecycleResult<BTreeSet<String>> {
        let threshold = format_ts(normalize(threshold));
        select_slugs(
            &self.lock(),
            "SELECT slug FROM module_lifecycle WHERE status = 'inactive' AND updated_at < ?1",
            params![threshold],
        )
    }
}
