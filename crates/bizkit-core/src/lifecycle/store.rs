//! `LifecycleStore` trait — the contract between the registry and the
//! ledger backend.
//!
//! Each transition is atomic per slug: status and its timestamp fields are
//! written together or not at all. Concurrent transitions on one slug are
//! last-write-wins. Implementations are `Send + Sync` and have a blanket
//! `Arc<T>` impl.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::LifecycleResult;

use super::types::ModuleLifecycleRecord;

pub trait LifecycleStore: Send + Sync {
    /// Create the record if missing. Returns `true` when a record was created.
    /// Never touches an existing record.
    fn install(&self, slug: &str) -> LifecycleResult<bool>;

    /// Mark active. Installs first (same transaction) when no record exists.
    fn activate(&self, slug: &str, actor: Option<&str>) -> LifecycleResult<ModuleLifecycleRecord>;

    /// Mark inactive. Fails with `NotInstalled` for unknown slugs.
    fn deactivate(&self, slug: &str, actor: Option<&str>)
        -> LifecycleResult<ModuleLifecycleRecord>;

    fn get(&self, slug: &str) -> LifecycleResult<Option<ModuleLifecycleRecord>>;

    fn list_records(&self) -> LifecycleResult<Vec<ModuleLifecycleRecord>>;

    fn list_active_slugs(&self) -> LifecycleResult<BTreeSet<String>>;

    /// Inactive modules whose last update is strictly older than `threshold`.
    fn list_inactive_since(&self, threshold: DateTime<Utc>) -> LifecycleResult<BTreeSet<String>>;
}

// ─── Arc blanket impl ───────────────────────────────────────────────

impl<T: LifecycleStore + ?Sized> LifecycleStore for Arc<T> {
    fn install(&self, slug: &str) -> LifecycleResult<bool> {
        (**self).install(slug)
    }
    fn activate(&self, slug: &str, actor: Option<&str>) -> LifecycleResult<ModuleLifecycleRecord> {
        (**self).activate(slug, actor)
    }
    fn deactivate(
        &self,
        slug: &str,
        actor: Option<&str>,
    ) -> LifecycleResult<ModuleLifecycleRecord> {
        (**self).deactivate(slug, actor)
    }
    fn get(&self, slug: &str) -> LifecycleResult<Option<ModuleLifecycleRecord>> {
        (**self).get(slug)
    }
    fn list_records(&self) -> LifecycleResult<Vec<ModuleLifecycleRecord>> {
        (**self).list_records()
    }
    fn list_active_slugs(&self) -> LifecycleResult<BTreeSet<String>> {
        (**self).list_active_slugs()
    }
    fn list_inactive_since(&self, threshold: DateTime<Utc>) -> LifecycleResult<BTreeSet<String>> {
        (**self).list_inactive_since(threshold)
    }
}
