//! `InMemoryLifecycleStore` — process-local ledger.
//!
//! Same semantics as the SQLite backend minus durability. Used by registry
//! tests and by embedders that persist elsewhere.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::audit::{record_best_effort, AuditEvent, AuditSink, TracingAuditSink};
use crate::clock::{Clock, SystemClock};
use crate::errors::{LifecycleError, LifecycleResult};
use crate::manifest::is_valid_slug;

use super::store::LifecycleStore;
use super::types::{ModuleLifecycleRecord, ModuleStatus};

pub struct InMemoryLifecycleStore {
    records: Mutex<BTreeMap<String, ModuleLifecycleRecord>>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
}

impl InMemoryLifecycleStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            clock,
            audit: Arc::new(TracingAuditSink),
        }
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Seed a record verbatim (test setup, imports).
    pub fn insert_record(&self, record: ModuleLifecycleRecord) {
        self.lock().insert(record.slug.clone(), record);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ModuleLifecycleRecord>> {
        // A poisoned map is still structurally valid: every write replaces a whole record.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
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

impl Default for InMemoryLifecycleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleStore for InMemoryLifecycleStore {
    fn install(&self, slug: &str) -> LifecycleResult<bool> {
        Self::check_slug(slug)?;
        let now = self.clock.now();
        let created = {
            let mut records = self.lock();
            if records.contains_key(slug) {
                false
            } else {
                records.insert(slug.to_string(), ModuleLifecycleRecord::installed(slug, now));
                true
            }
        };
        if created {
            record_best_effort(
                self.audit.as_ref(),
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
        let now = self.clock.now();
        let (record, created) = {
            let mut records = self.lock();
            let created = !records.contains_key(slug);
            let record = records
                .entry(slug.to_string())
                .or_insert_with(|| ModuleLifecycleRecord::installed(slug, now));
            record.apply_activate(now);
            (record.clone(), created)
        };
        if created {
            record_best_effort(
                self.audit.as_ref(),
                &AuditEvent::Installed {
                    slug: slug.to_string(),
                    at: now,
                },
            );
        }
        record_best_effort(
            self.audit.as_ref(),
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
        let now = self.clock.now();
        let record = {
            let mut records = self.lock();
            let record = records
                .get_mut(slug)
                .ok_or_else(|| LifecycleError::NotInstalled {
                    slug: slug.to_string(),
                })?;
            record.apply_deactivate(actor, now);
            record.clone()
        };
        record_best_effort(
            self.audit.as_ref(),
            &AuditEvent::Deactivated {
                slug: slug.to_string(),
                actor: actor.map(str::to_string),
                at: now,
            },
        );
        Ok(record)
    }

    fn get(&self, slug: &str) -> LifecycleResult<Option<ModuleLifecycleRecord>> {
        Ok(self.lock().get(slug).cloned())
    }

    fn list_records(&self) -> LifecycleResult<Vec<ModuleLifecycleRecord>> {
        Ok(self.lock().values().cloned().collect())
    }

    fn list_active_slugs(&self) -> LifecycleResult<BTreeSet<String>> {
        Ok(self
            .lock()
            .values()
            .filter(|r| r.status == ModuleStatus::Active)
            .map(|r| r.slug.clone())
            .collect())
    }

    fn list_inactive_since(&self, threshold: DateTime<Utc>) -> LifecycleResult<BTreeSet<String>> {
        Ok(self
            .lock()
            .values()
            .filter(|r| r.status == ModuleStatus::Inactive && r.updated_at < threshold)
            .map(|r| r.slug.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::audit::AuditError;
    use crate::clock::FixedClock;

    fn store_at(now: DateTime<Utc>) -> (InMemoryLifecycleStore, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(now));
        (InMemoryLifecycleStore::with_clock(clock.clone()), clock)
    }

    #[test]
    fn install_is_idempotent() {
        let t0 = Utc::now();
        let (store, clock) = store_at(t0);
        assert!(store.install("billing").unwrap());
        clock.advance(Duration::days(5));
        assert!(!store.install("billing").unwrap());

        let records = store.list_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].installed_at, t0);
        assert_eq!(records[0].status, ModuleStatus::Inactive);
    }

    #[test]
    fn activate_installs_missing_record() {
        let t0 = Utc::now();
        let (store, _) = store_at(t0);
        let record = store.activate("billing", Some("admin")).unwrap();
        assert!(record.is_active());
        assert_eq!(record.installed_at, t0);
        assert_eq!(
            store.list_active_slugs().unwrap(),
            BTreeSet::from(["billing".to_string()])
        );
    }

    #[test]
    fn deactivate_unknown_slug_fails() {
        let (store, _) = store_at(Utc::now());
        assert!(matches!(
            store.deactivate("ghost", None),
            Err(LifecycleError::NotInstalled { .. })
        ));
        assert!(store.list_records().unwrap().is_empty());
    }

    #[test]
    fn invalid_slug_rejected() {
        let (store, _) = store_at(Utc::now());
        assert!(matches!(
            store.install("Not A Slug"),
            Err(LifecycleError::InvalidSlug { .. })
        ));
    }

    #[test]
    fn inactive_since_uses_strict_threshold() {
        let t0 = Utc::now();
        let (store, clock) = store_at(t0);
        store.activate("old", None).unwrap();
        store.deactivate("old", Some("ops")).unwrap();
        clock.advance(Duration::days(10));
        store.activate("recent", None).unwrap();
        store.deactivate("recent", None).unwrap();
        store.activate("running", None).unwrap();

        let stale = store.list_inactive_since(t0 + Duration::days(1)).unwrap();
        assert_eq!(stale, BTreeSet::from(["old".to_string()]));
        assert!(store.list_inactive_since(t0).unwrap().is_empty());
    }

    struct BrokenSink;

    impl AuditSink for BrokenSink {
        fn record(&self, _event: &AuditEvent) -> Result<(), AuditError> {
            Err(AuditError("sink offline".to_string()))
        }
    }

    #[test]
    fn audit_failure_does_not_abort_transition() {
        let store = InMemoryLifecycleStore::new().with_audit_sink(Arc::new(BrokenSink));
        store.activate("billing", Some("admin")).unwrap();
        assert!(store.get("billing").unwrap().unwrap().is_active());
    }
}
