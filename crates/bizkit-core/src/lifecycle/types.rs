//! Lifecycle record types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Active,
    Inactive,
}

impl ModuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("unknown module status '{other}'")),
        }
    }
}

/// One row of the lifecycle ledger. Exactly one per slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleLifecycleRecord {
    pub slug: String,
    pub status: ModuleStatus,
    /// Set once on first install, never overwritten.
    pub installed_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ModuleLifecycleRecord {
    /// Fresh record as created by `install`.
    pub fn installed(slug: &str, now: DateTime<Utc>) -> Self {
        Self {
            slug: slug.to_string(),
            status: ModuleStatus::Inactive,
            installed_at: now,
            activated_at: None,
            deactivated_at: None,
            deactivated_by: None,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ModuleStatus::Active
    }

    /// Apply an activation: status, `activated_at`, and cleared deactivation fields together.
    pub fn apply_activate(&mut self, now: DateTime<Utc>) {
        self.status = ModuleStatus::Active;
        self.activated_at = Some(now);
        self.deactivated_at = None;
        self.deactivated_by = None;
        self.updated_at = now;
    }

    pub fn apply_deactivate(&mut self, actor: Option<&str>, now: DateTime<Utc>) {
        self.status = ModuleStatus::Inactive;
        self.deactivated_at = Some(now);
        self.deactivated_by = actor.map(str::to_string);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn transitions_keep_fields_consistent() {
        let t0 = Utc::now();
        let mut record = ModuleLifecycleRecord::installed("billing", t0);
        assert!(!record.is_active());

        record.apply_deactivate(Some("ops"), t0 + Duration::hours(1));
        record.apply_activate(t0 + Duration::hours(2));
        assert!(record.is_active());
        assert_eq!(record.deactivated_at, None);
        assert_eq!(record.deactivated_by, None);
        assert_eq!(record.installed_at, t0);

        record.apply_deactivate(Some("ops"), t0 + Duration::hours(3));
        assert_eq!(record.status, ModuleStatus::Inactive);
        assert_eq!(record.deactivated_by.as_deref(), Some("ops"));
        assert_eq!(record.activated_at, Some(t0 + Duration::hours(2)));
        assert_eq!(record.updated_at, t0 + Duration::hours(3));
    }

    #[test]
    fn status_parses() {
        assert_eq!("active".parse::<ModuleStatus>().unwrap(), ModuleStatus::Active);
        assert!("enabled".parse::<ModuleStatus>().is_err());
    }
}
