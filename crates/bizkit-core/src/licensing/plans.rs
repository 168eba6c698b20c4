//! Plan catalog: which modules each commercial plan includes.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::LicensingConfig;

/// Built-in plans. Config entries with the same name replace these.
const BUILTIN_PLANS: [(&str, &[&str]); 3] = [
    ("starter", &["scheduling", "customers"]),
    (
        "professional",
        &["scheduling", "customers", "billing", "notifications", "reports"],
    ),
    (
        "enterprise",
        &[
            "scheduling",
            "customers",
            "billing",
            "notifications",
            "reports",
            "inventory",
            "marketing",
            "multi-location",
            "api",
        ],
    ),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanCatalog {
    plans: BTreeMap<String, BTreeSet<String>>,
}

impl PlanCatalog {
    /// Empty catalog: no plan grants anything.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let plans = BUILTIN_PLANS
            .iter()
            .map(|(name, modules)| {
                (
                    (*name).to_string(),
                    modules.iter().map(|m| (*m).to_string()).collect(),
                )
            })
            .collect();
        Self { plans }
    }

    /// Built-in plans overlaid with the configured ones.
    pub fn from_config(config: &LicensingConfig) -> Self {
        let mut catalog = Self::builtin();
        for (name, modules) in &config.plans {
            catalog.insert(name, modules.iter().map(String::as_str));
        }
        catalog
    }

    pub fn insert<'a, I>(&mut self, plan: &str, modules: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.plans.insert(
            plan.to_string(),
            modules.into_iter().map(str::to_string).collect(),
        );
    }

    /// Unknown plans include nothing.
    pub fn includes(&self, plan: &str, slug: &str) -> bool {
        self.plans
            .get(plan)
            .is_some_and(|modules| modules.contains(slug))
    }

    pub fn modules(&self, plan: &str) -> Option<&BTreeSet<String>> {
        self.plans.get(plan)
    }

    pub fn plan_names(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }
}
