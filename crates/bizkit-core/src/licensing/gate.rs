//! LicenseGate — module entitlement and feature checks.
//!
//! Every check is a pure function of its arguments plus the gate's static
//! configuration (dev mode, grace window, plan catalog). The gate holds no
//! mutable state, so the same inputs always produce the same answer.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::LicensingConfig;
use crate::errors::GateError;
use crate::manifest::ModuleManifest;

use super::features::Feature;
use super::payload::LicensePayload;
use super::plans::PlanCatalog;

/// Why a module was let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessBasis {
    DevMode,
    AlwaysActive,
    ExplicitLicense,
    Plan(String),
    GracePeriod {
        deadline: DateTime<Utc>,
        days_remaining: i64,
    },
}

/// Why a module was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// Not entitled and the grace window cannot be evaluated (install time unknown).
    LicenseDenied,
    /// Not entitled and the grace window has closed.
    GraceExpired,
}

/// Result of a module gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleAccess {
    Allowed(AccessBasis),
    Denied(DenialReason),
}

impl ModuleAccess {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Denied(reason) => Some(*reason),
            Self::Allowed(_) => None,
        }
    }
}

/// Diagnostic hook for gate decisions.
///
/// Called after a decision is computed; an observer can watch results but
/// has no way to change them.
pub trait GateObserver: Send + Sync {
    fn on_feature_check(&self, _feature: &Feature, _enabled: bool) {}
    fn on_module_check(&self, _slug: &str, _access: &ModuleAccess) {}
}

#[derive(Clone)]
pub struct LicenseGate {
    dev_mode: bool,
    grace_period: Duration,
    plans: PlanCatalog,
    observer: Option<Arc<dyn GateObserver>>,
}

impl std::fmt::Debug for LicenseGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseGate")
            .field("dev_mode", &self.dev_mode)
            .field("grace_period_days", &self.grace_period.num_days())
            .field("plans", &self.plans)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl LicenseGate {
    pub fn new(grace_period_days: u32, plans: PlanCatalog) -> Self {
        Self {
            dev_mode: false,
            grace_period: Duration::days(i64::from(grace_period_days)),
            plans,
            observer: None,
        }
    }

    pub fn from_config(config: &LicensingConfig) -> Self {
        Self::new(config.grace_period_days, PlanCatalog::from_config(config))
            .with_dev_mode(config.dev_mode)
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn GateObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    pub fn grace_period_days(&self) -> i64 {
        self.grace_period.num_days()
    }

    pub fn plans(&self) -> &PlanCatalog {
        &self.plans
    }

    /// Last instant at which an unlicensed module installed at `installed_at` may still run.
    pub fn grace_deadline(&self, installed_at: DateTime<Utc>) -> DateTime<Utc> {
        installed_at + self.grace_period
    }

    /// Decide whether `slug` may run. First matching rule wins:
    /// dev mode, `always_active`, explicit license entry, plan membership,
    /// then the grace window (`now <= installed_at + grace`, inclusive).
    /// Unknown `installed_at` fails closed.
    pub fn check_module(
        &self,
        slug: &str,
        manifest: &ModuleManifest,
        license: &LicensePayload,
        installed_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> ModuleAccess {
        let access = self.decide_module(slug, manifest, license, installed_at, now);
        if let ModuleAccess::Denied(reason) = &access {
            debug!(slug, ?reason, license_required = manifest.license_required, "module gate denied");
        }
        if let Some(observer) = &self.observer {
            observer.on_module_check(slug, &access);
        }
        access
    }

    pub fn is_module_allowed(
        &self,
        slug: &str,
        manifest: &ModuleManifest,
        license: &LicensePayload,
        installed_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        self.check_module(slug, manifest, license, installed_at, now)
            .is_allowed()
    }

    fn decide_module(
        &self,
        slug: &str,
        manifest: &ModuleManifest,
        license: &LicensePayload,
        installed_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> ModuleAccess {
        if self.dev_mode {
            return ModuleAccess::Allowed(AccessBasis::DevMode);
        }
        if manifest.always_active {
            return ModuleAccess::Allowed(AccessBasis::AlwaysActive);
        }
        if license.lists_module(slug) {
            return ModuleAccess::Allowed(AccessBasis::ExplicitLicense);
        }
        if let Some(plan) = &license.plan {
            if self.plans.includes(plan, slug) {
                return ModuleAccess::Allowed(AccessBasis::Plan(plan.clone()));
            }
        }

        let Some(installed_at) = installed_at else {
            return ModuleAccess::Denied(DenialReason::LicenseDenied);
        };
        let deadline = self.grace_deadline(installed_at);
        if now <= deadline {
            ModuleAccess::Allowed(AccessBasis::GracePeriod {
                deadline,
                days_remaining: (deadline - now).num_days(),
            })
        } else {
            ModuleAccess::Denied(DenialReason::GraceExpired)
        }
    }

    /// Pure membership test against `license.features`. Features have no grace window.
    pub fn is_feature_enabled(&self, feature: &Feature, license: &LicensePayload) -> bool {
        let enabled = self.dev_mode || license.has_feature(feature);
        if let Some(observer) = &self.observer {
            observer.on_feature_check(feature, enabled);
        }
        enabled
    }

    /// Reject an action outright when `feature` is not licensed.
    pub fn ensure_feature(
        &self,
        module_slug: &str,
        feature: &Feature,
        license: &LicensePayload,
    ) -> Result<(), GateError> {
        if self.is_feature_enabled(feature, license) {
            Ok(())
        } else {
            Err(GateError::FeatureNotAvailable {
                module: module_slug.to_string(),
                feature: feature.clone(),
            })
        }
    }

    /// Features a manifest declares that the license does not enable.
    pub fn missing_features(
        &self,
        manifest: &ModuleManifest,
        license: &LicensePayload,
    ) -> Vec<Feature> {
        if self.dev_mode {
            return Vec::new();
        }
        manifest
            .features_required
            .iter()
            .filter(|f| !license.has_feature(f))
            .cloned()
            .collect()
    }
}

impl Default for LicenseGate {
    fn default() -> Self {
        Self::from_config(&LicensingConfig::default())
    }
}
