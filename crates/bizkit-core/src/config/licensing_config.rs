//! License gate configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Trial window for unlicensed modules, counted from first install.
pub const DEFAULT_GRACE_PERIOD_DAYS: u32 = 14;

/// Upper bound accepted from config (~10 years).
pub const MAX_GRACE_PERIOD_DAYS: u32 = 3650;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LicensingConfig {
    /// Days an unlicensed module keeps running after install. Default: 14.
    pub grace_period_days: u32,
    /// Bypass all module and feature gating. Development only.
    pub dev_mode: bool,
    /// Plan name -> module slugs. Entries replace the built-in plan of the same name.
    pub plans: BTreeMap<String, Vec<String>>,
}

impl Default for LicensingConfig {
    fn default() -> Self {
        Self {
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            dev_mode: false,
            plans: BTreeMap::new(),
        }
    }
}
