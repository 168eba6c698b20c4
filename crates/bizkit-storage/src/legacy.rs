//! One-shot migration from the legacy global install flag.
//!
//! Older deployments stored a single `modules.installed_at` value in
//! `app_settings` and applied it to every module. On boot we fan it out into
//! per-module ledger rows and drop the key, so the grace clock of existing
//! installs keeps its original start. Runs in one transaction; once the key
//! is gone every later call is a no-op.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tracing::{info, warn};

use bizkit_core::audit::{record_best_effort, AuditEvent};
use bizkit_core::errors::{LifecycleError, LifecycleResult};
use bizkit_core::lifecycle::ModuleStatus;
use bizkit_core::manifest::is_valid_slug;

use crate::lifecycle_store::{insert_event, insert_if_missing, SqliteLifecycleStore};
use crate::timestamps::{format_ts, normalize, parse_legacy_ts};
use crate::to_storage_err;

/// `app_settings` key written by older deployments.
pub const LEGACY_INSTALLED_AT_KEY: &str = "modules.installed_at";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LegacyMigrationReport {
    /// Slugs that received a new record seeded from the legacy value.
    pub migrated: Vec<String>,
    /// Slugs that already had a record and were left untouched.
    pub skipped_existing: Vec<String>,
    /// The legacy value, `None` when there was nothing to migrate.
    pub legacy_installed_at: Option<DateTime<Utc>>,
}

impl LegacyMigrationReport {
    pub fn is_noop(&self) -> bool {
        self.legacy_installed_at.is_none()
    }
}

impl SqliteLifecycleStore {
    /// Fan the legacy install flag out to `slugs`, then delete it.
    ///
    /// New records are created `active` with `installed_at` and
    /// `activated_at` set to the legacy value. A malformed legacy value is
    /// an error and leaves the database untouched. With no valid slug the
    /// call is a no-op and the legacy key stays in place.
    pub fn migrate_legacy_install_flag<'a, I>(
        &self,
        slugs: I,
    ) -> LifecycleResult<LegacyMigrationReport>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let now = format_ts(self.now());
        let mut report = LegacyMigrationReport::default();

        let slugs: Vec<&str> = slugs
            .into_iter()
            .filter(|slug| {
                let valid = is_valid_slug(slug);
                if !valid {
                    warn!(slug, "skipping invalid slug during legacy migration");
                }
                valid
            })
            .collect();

        let installed_at = {
            let mut conn = self.lock();
            let tx = conn.transaction().map_err(to_storage_err)?;

            let raw: Option<String> = tx
                .query_row(
                    "SELECT value FROM app_settings WHERE key = ?1",
                    [LEGACY_INSTALLED_AT_KEY],
                    |row| row.get(0),
                )
                .optional()
                .map_err(to_storage_err)?;

            let Some(raw) = raw else {
                return Ok(report);
            };
            let installed_at = parse_legacy_ts(&raw)
                .map(normalize)
                .ok_or(LifecycleError::LegacyValueInvalid { value: raw })?;
            let legacy = format_ts(installed_at);

            // The key is the only copy of the install time: keep it until
            // there is at least one module to carry it.
            if slugs.is_empty() {
                warn!(
                    legacy = %legacy,
                    "no module slugs to migrate, keeping legacy install flag"
                );
                return Ok(report);
            }

            for slug in slugs {
                if insert_if_missing(&tx, slug, &legacy, ModuleStatus::Active, Some(&legacy), &now)? {
                    insert_event(&tx, slug, "legacy_migrated", None, &now)?;
                    report.migrated.push(slug.to_string());
                } else {
                    report.skipped_existing.push(slug.to_string());
                }
            }

            tx.execute(
                "DELETE FROM app_settings WHERE key = ?1",
                [LEGACY_INSTALLED_AT_KEY],
            )
            .map_err(to_storage_err)?;
            tx.commit().map_err(to_storage_err)?;
            installed_at
        };
        report.legacy_installed_at = Some(installed_at);

        info!(
            migrated = report.migrated.len(),
            skipped = report.skipped_existing.len(),
            "legacy install flag migrated"
        );
        for slug in &report.migrated {
            record_best_effort(
                self.audit(),
                &AuditEvent::LegacyMigrated {
                    slug: slug.clone(),
                    installed_at,
                },
            );
        }
        Ok(report)
    }

    pub fn get_setting(&self, key: &str) -> LifecycleResult<Option<String>> {
        self.lock()
            .query_row("SELECT value FROM app_settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(to_storage_err)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> LifecycleResult<()> {
        let now = format_ts(self.now());
        self.lock()
            .execute(
                "INSERT INTO app_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .map_err(to_storage_err)?;
        Ok(())
    }
}
