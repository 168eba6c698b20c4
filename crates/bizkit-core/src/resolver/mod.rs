//! Dependency resolution — the maximal safe subset of requested modules.
//!
//! Candidates start as `requested ∩ manifests`. A candidate stays allowed
//! only while its license decision is granted and every declared dependency
//! has a manifest and is itself still allowed. Exclusion is monotonic, so
//! the loop reaches the same fixed point whatever order modules are visited
//! in. Exclusions are data, never errors.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{debug, info};

use crate::licensing::gate::DenialReason;
use crate::licensing::ModuleAccess;
use crate::manifest::{ManifestMap, ModuleManifest};

/// Outcome of the license gate as seen by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseDecision {
    Granted,
    Denied(DenialReason),
}

impl From<&ModuleAccess> for LicenseDecision {
    fn from(access: &ModuleAccess) -> Self {
        match access.denial() {
            Some(reason) => Self::Denied(reason),
            None => Self::Granted,
        }
    }
}

impl From<bool> for LicenseDecision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Self::Granted
        } else {
            Self::Denied(DenialReason::LicenseDenied)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExclusionReason {
    None,
    /// A direct dependency has no manifest at all.
    MissingDependency,
    /// A direct dependency exists but is itself excluded.
    DependencyExcluded,
    LicenseDenied,
    GraceExpired,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::MissingDependency => "MISSING_DEPENDENCY",
            Self::DependencyExcluded => "DEPENDENCY_EXCLUDED",
            Self::LicenseDenied => "LICENSE_DENIED",
            Self::GraceExpired => "GRACE_EXPIRED",
        }
    }
}

impl From<DenialReason> for ExclusionReason {
    fn from(reason: DenialReason) -> Self {
        match reason {
            DenialReason::LicenseDenied => Self::LicenseDenied,
            DenialReason::GraceExpired => Self::GraceExpired,
        }
    }
}

/// Resolution verdict for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub allowed: bool,
    pub reason: ExclusionReason,
    /// The direct dependency blamed for a dependency exclusion.
    pub dependency: Option<String>,
}

impl Resolution {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: ExclusionReason::None,
            dependency: None,
        }
    }

    fn excluded(reason: ExclusionReason, dependency: Option<String>) -> Self {
        Self {
            allowed: false,
            reason,
            dependency,
        }
    }
}

/// Per-slug verdicts for every requested slug that has a manifest.
/// Recomputed on each pass, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedModuleSet {
    entries: BTreeMap<String, Resolution>,
}

impl ResolvedModuleSet {
    pub fn is_allowed(&self, slug: &str) -> bool {
        self.entries.get(slug).is_some_and(|r| r.allowed)
    }

    /// `None` when the slug was never a candidate (not requested or no manifest).
    pub fn reason(&self, slug: &str) -> Option<ExclusionReason> {
        self.entries.get(slug).map(|r| r.reason)
    }

    pub fn get(&self, slug: &str) -> Option<&Resolution> {
        self.entries.get(slug)
    }

    pub fn allowed_slugs(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|(_, r)| r.allowed)
            .map(|(slug, _)| slug.clone())
            .collect()
    }

    pub fn excluded(&self) -> impl Iterator<Item = (&str, &Resolution)> {
        self.entries
            .iter()
            .filter(|(_, r)| !r.allowed)
            .map(|(slug, r)| (slug.as_str(), r))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolution)> {
        self.entries.iter().map(|(slug, r)| (slug.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compute the allowed subset of `requested`.
///
/// `license_decision` is called exactly once per candidate.
pub fn resolve<'a, I, F>(
    manifests: &ManifestMap,
    requested: I,
    mut license_decision: F,
) -> ResolvedModuleSet
where
    I: IntoIterator<Item = &'a str>,
    F: FnMut(&str, &ModuleManifest) -> LicenseDecision,
{
    // 1. Seed: requested slugs that have a manifest.
    let mut candidates: BTreeSet<&str> = BTreeSet::new();
    for slug in requested {
        match manifests.get_key_value(slug) {
            Some((key, _)) => {
                candidates.insert(key.as_str());
            }
            None => debug!(slug, "requested module has no manifest, dropping"),
        }
    }

    let mut entries: BTreeMap<String, Resolution> = BTreeMap::new();
    let mut allowed: FxHashSet<&str> = FxHashSet::default();

    for &slug in &candidates {
        let manifest = &manifests[slug];
        match license_decision(slug, manifest) {
            LicenseDecision::Granted => {
                allowed.insert(slug);
            }
            LicenseDecision::Denied(reason) => {
                entries.insert(slug.to_string(), Resolution::excluded(reason.into(), None));
            }
        }
    }

    // 2. Fixed-point shrink.
    let mut passes = 0usize;
    loop {
        passes += 1;
        let mut removed: Vec<(&str, ExclusionReason, String)> = Vec::new();

        for &slug in &candidates {
            if !allowed.contains(slug) {
                continue;
            }
            let deps = &manifests[slug].dependencies;
            if let Some(dep) = deps.iter().find(|d| !manifests.contains_key(*d)) {
                removed.push((slug, ExclusionReason::MissingDependency, dep.clone()));
            } else if let Some(dep) = deps.iter().find(|d| !allowed.contains(d.as_str())) {
                removed.push((slug, ExclusionReason::DependencyExcluded, dep.clone()));
            }
        }

        if removed.is_empty() {
            break;
        }
        for (slug, reason, dep) in removed {
            allowed.remove(slug);
            entries.insert(slug.to_string(), Resolution::excluded(reason, Some(dep)));
        }
    }

    // 3. Survivors are allowed.
    for &slug in &allowed {
        entries.insert(slug.to_string(), Resolution::allowed());
    }

    for (slug, resolution) in entries.iter().filter(|(_, r)| !r.allowed) {
        info!(
            slug = %slug,
            reason = resolution.reason.as_str(),
            dependency = resolution.dependency.as_deref().unwrap_or(""),
            "module excluded"
        );
    }
    debug!(
        candidates = candidates.len(),
        allowed = allowed.len(),
        passes,
        "dependency resolution complete"
    );

    ResolvedModuleSet { entries }
}
