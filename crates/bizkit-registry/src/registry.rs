//! `ModuleRegistry` — one boot pass from persisted state to running modules.
//!
//! All collaborators are passed in explicitly; there are no process-wide
//! singletons. A registry boots each module at most once over its lifetime,
//! however many times `load_modules` runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use bizkit_core::clock::{Clock, SystemClock};
use bizkit_core::config::BizkitConfig;
use bizkit_core::errors::GateError;
use bizkit_core::licensing::{Feature, LicenseGate, LicensePayload, ModuleAccess};
use bizkit_core::lifecycle::LifecycleStore;
use bizkit_core::manifest::ManifestStore;
use bizkit_core::resolver::{resolve, LicenseDecision, ResolvedModuleSet};
use bizkit_storage::SqliteLifecycleStore;

use crate::boot_order::boot_order;
use crate::errors::RegistryResult;
use crate::module::{BootContext, Module, ModuleFactories};
use crate::status::{access_label, grace_window, ModuleStatusEntry};

pub struct ModuleRegistry {
    manifests: ManifestStore,
    gate: LicenseGate,
    lifecycle: Arc<dyn LifecycleStore>,
    factories: ModuleFactories,
    clock: Arc<dyn Clock>,

    license: LicensePayload,
    resolved: ResolvedModuleSet,
    access: BTreeMap<String, ModuleAccess>,
    /// Booted instances in boot order, keyed by registered slug.
    booted: Vec<(String, Box<dyn Module>)>,
    booted_index: BTreeMap<String, usize>,
}

impl ModuleRegistry {
    pub fn new(
        manifests: ManifestStore,
        gate: LicenseGate,
        lifecycle: Arc<dyn LifecycleStore>,
        factories: ModuleFactories,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            manifests,
            gate,
            lifecycle,
            factories,
            clock,
            license: LicensePayload::unlicensed(),
            resolved: ResolvedModuleSet::default(),
            access: BTreeMap::new(),
            booted: Vec::new(),
            booted_index: BTreeMap::new(),
        }
    }

    /// Wire a registry from configuration: TOML manifests, SQLite ledger,
    /// configured gate. `BIZKIT_DEV_MODE` is applied on top of `config`.
    /// Migrates the legacy install flag for every known manifest before
    /// returning. Installing the tracing subscriber stays with the caller
    /// (`bizkit_core::tracing::init_tracing`).
    pub fn from_config(config: &BizkitConfig, factories: ModuleFactories) -> RegistryResult<Self> {
        let mut config = config.clone();
        config.apply_env_overrides();

        let manifests = ManifestStore::from_config(&config.manifests);
        let store = SqliteLifecycleStore::from_config(&config.storage)?;

        let known = manifests.get_all()?;
        if known.is_empty() {
            warn!(
                dir = %config.manifests.dir,
                "no module manifests found, legacy install flag left for a later boot"
            );
        } else {
            // Every manifest-known slug is seeded `active`, so the first
            // upgraded boot requests all of them, including modules the old
            // deployment never switched on. The gate still decides which run.
            let report = store.migrate_legacy_install_flag(known.keys().map(String::as_str))?;
            if !report.is_noop() {
                info!(migrated = ?report.migrated, "seeded lifecycle records from legacy install flag");
            }
        }

        Ok(Self::new(
            manifests,
            LicenseGate::from_config(&config.licensing),
            Arc::new(store),
            factories,
            Arc::new(SystemClock),
        ))
    }

    /// Resolve the allowed set for `license` and boot every allowed module
    /// that is not running yet.
    pub fn load_modules(&mut self, license: LicensePayload) -> RegistryResult<&ResolvedModuleSet> {
        let requested = self.lifecycle.list_active_slugs()?;
        let manifests = self.manifests.get_all()?;
        let now = self.clock.now();

        let mut installed_at: BTreeMap<&str, DateTime<Utc>> = BTreeMap::new();
        for slug in requested.iter().filter(|s| manifests.contains_key(*s)) {
            if let Some(record) = self.lifecycle.get(slug)? {
                installed_at.insert(slug.as_str(), record.installed_at);
            }
        }

        let gate = &self.gate;
        let mut access = BTreeMap::new();
        let resolved = resolve(&manifests, requested.iter().map(String::as_str), |slug, manifest| {
            let decision = gate.check_module(
                slug,
                manifest,
                &license,
                installed_at.get(slug).copied(),
                now,
            );
            let verdict = LicenseDecision::from(&decision);
            access.insert(slug.to_string(), decision);
            verdict
        });

        let allowed = resolved.allowed_slugs();
        let plan = boot_order(&manifests, &allowed);
        for cycle in &plan.cycles {
            warn!(members = ?cycle, "dependency cycle among allowed modules, booting in slug order");
        }

        let ctx = BootContext::new(&allowed, &license);
        for slug in &plan.order {
            if self.booted_index.contains_key(slug) {
                continue;
            }
            let Some(mut module) = self.factories.create(slug) else {
                warn!(slug = %slug, "allowed module has no registered factory, not booted");
                continue;
            };
            if module.slug() != slug.as_str() {
                warn!(slug = %slug, reported = module.slug(), "module reports a different slug");
            }
            module.boot(&ctx);
            debug!(slug = %slug, "module booted");
            self.booted_index.insert(slug.clone(), self.booted.len());
            self.booted.push((slug.clone(), module));
        }

        info!(
            requested = requested.len(),
            allowed = allowed.len(),
            booted = self.booted.len(),
            "module load complete"
        );

        self.license = license;
        self.access = access;
        self.resolved = resolved;
        Ok(&self.resolved)
    }

    /// Whether `slug` is in the allowed set of the last load.
    pub fn is_active(&self, slug: &str) -> bool {
        self.resolved.is_allowed(slug)
    }

    pub fn is_module_active(&self, slug: &str) -> bool {
        self.is_active(slug)
    }

    /// Booted modules still allowed by the last load, in boot order.
    pub fn get_all_modules(&self) -> Vec<&dyn Module> {
        self.booted
            .iter()
            .filter(|(slug, _)| self.is_active(slug))
            .map(|(_, module)| module.as_ref())
            .collect()
    }

    pub fn get_module(&self, slug: &str) -> Option<&dyn Module> {
        if !self.is_active(slug) {
            return None;
        }
        self.booted_index
            .get(slug)
            .map(|&idx| self.booted[idx].1.as_ref())
    }

    pub fn is_booted(&self, slug: &str) -> bool {
        self.booted_index.contains_key(slug)
    }

    /// Feature check against the license of the last load.
    pub fn ensure_feature(&self, slug: &str, feature: &Feature) -> Result<(), GateError> {
        self.gate.ensure_feature(slug, feature, &self.license)
    }

    pub fn is_feature_enabled(&self, feature: &Feature) -> bool {
        self.gate.is_feature_enabled(feature, &self.license)
    }

    pub fn resolved(&self) -> &ResolvedModuleSet {
        &self.resolved
    }

    pub fn license(&self) -> &LicensePayload {
        &self.license
    }

    pub fn gate(&self) -> &LicenseGate {
        &self.gate
    }

    pub fn manifests(&self) -> &ManifestStore {
        &self.manifests
    }

    pub fn lifecycle(&self) -> &Arc<dyn LifecycleStore> {
        &self.lifecycle
    }

    /// One row per known manifest, reflecting the last load.
    pub fn status_report(&self) -> RegistryResult<Vec<ModuleStatusEntry>> {
        let manifests = self.manifests.get_all()?;
        let records: BTreeMap<String, _> = self
            .lifecycle
            .list_records()?
            .into_iter()
            .map(|r| (r.slug.clone(), r))
            .collect();

        let entries = manifests
            .iter()
            .map(|(slug, manifest)| {
                let record = records.get(slug);
                let resolution = self.resolved.get(slug);
                let access = self.access.get(slug);
                let grace = access.and_then(grace_window);
                ModuleStatusEntry {
                    slug: slug.clone(),
                    name: manifest.name.clone(),
                    version: manifest.version.clone(),
                    installed: record.is_some(),
                    lifecycle_status: record.map(|r| r.status),
                    allowed: resolution.is_some_and(|r| r.allowed),
                    reason: resolution.map(|r| r.reason),
                    dependency: resolution.and_then(|r| r.dependency.clone()),
                    access_basis: access.and_then(access_label),
                    grace_deadline: grace.map(|(deadline, _)| deadline),
                    grace_days_remaining: grace.map(|(_, days)| days),
                    missing_features: self.gate.missing_features(manifest, &self.license),
                    tenant_required: manifest.tenant_required,
                    booted: self.booted_index.contains_key(slug),
                }
            })
            .collect();
        Ok(entries)
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("gate", &self.gate)
            .field("factories", &self.factories)
            .field("allowed", &self.resolved.allowed_slugs())
            .field("booted", &self.booted_index.keys().collect::<BTreeSet<_>>())
            .finish()
    }
}
