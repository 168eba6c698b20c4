//! License payload handed in by the entitlement collaborator.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::features::Feature;

/// Resolved license entitlements. Treated as an immutable value: a new
/// license replaces the old payload wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicensePayload {
    pub key: String,
    pub plan: Option<String>,
    /// Explicitly licensed module slugs.
    pub modules: BTreeSet<String>,
    /// Enabled feature keys.
    pub features: BTreeSet<Feature>,
}

impl LicensePayload {
    /// No key, no plan, nothing licensed.
    pub fn unlicensed() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_plan(mut self, plan: &str) -> Self {
        self.plan = Some(plan.to_string());
        self
    }

    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_features<I>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = Feature>,
    {
        self.features = features.into_iter().collect();
        self
    }

    pub fn lists_module(&self, slug: &str) -> bool {
        self.modules.contains(slug)
    }

    pub fn has_feature(&self, feature: &Feature) -> bool {
        self.features.contains(feature)
    }
}
