//! Per-module status rows for admin screens.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bizkit_core::licensing::gate::{AccessBasis, ModuleAccess};
use bizkit_core::licensing::Feature;
use bizkit_core::lifecycle::ModuleStatus;
use bizkit_core::resolver::ExclusionReason;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleStatusEntry {
    pub slug: String,
    pub name: String,
    pub version: String,
    /// A lifecycle record exists.
    pub installed: bool,
    pub lifecycle_status: Option<ModuleStatus>,
    pub allowed: bool,
    /// `None` when the module was not requested in the last pass.
    pub reason: Option<ExclusionReason>,
    /// Blamed dependency for dependency exclusions.
    pub dependency: Option<String>,
    pub access_basis: Option<String>,
    pub grace_deadline: Option<DateTime<Utc>>,
    pub grace_days_remaining: Option<i64>,
    pub missing_features: Vec<Feature>,
    pub tenant_required: bool,
    pub booted: bool,
}

/// Short label for why the gate let a module through.
pub fn access_label(access: &ModuleAccess) -> Option<String> {
    let ModuleAccess::Allowed(basis) = access else {
        return None;
    };
    Some(match basis {
        AccessBasis::DevMode => "dev_mode".to_string(),
        AccessBasis::AlwaysActive => "always_active".to_string(),
        AccessBasis::ExplicitLicense => "explicit_license".to_string(),
        AccessBasis::Plan(plan) => format!("plan:{plan}"),
        AccessBasis::GracePeriod { .. } => "grace_period".to_string(),
    })
}

pub fn grace_window(access: &ModuleAccess) -> Option<(DateTime<Utc>, i64)> {
    match access {
        ModuleAccess::Allowed(AccessBasis::GracePeriod {
            deadline,
            days_remaining,
        }) => Some((*deadline, *days_remaining)),
        _ => None,
    }
}
