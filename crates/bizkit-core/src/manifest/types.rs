//! Declared module metadata.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::licensing::Feature;

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "0.0.0".to_string()
}

/// Load-time metadata describing a module's identity and requirements.
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Unique identifier. May be omitted in `module.toml`; the directory name is used.
    #[serde(default)]
    pub slug: String,
    /// Display name. Defaults to the slug.
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Slugs that must be present and allowed for this module to run.
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    #[serde(default = "default_true")]
    pub license_required: bool,
    #[serde(default)]
    pub features_required: BTreeSet<Feature>,
    /// Bypasses license gating entirely.
    #[serde(default)]
    pub always_active: bool,
    #[serde(default)]
    pub tenant_required: bool,
}

impl ModuleManifest {
    /// Minimal manifest with defaults, handy for tests and static sources.
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            name: slug.to_string(),
            version: default_version(),
            dependencies: BTreeSet::new(),
            license_required: true,
            features_required: BTreeSet::new(),
            always_active: false,
            tenant_required: false,
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn always_active(mut self) -> Self {
        self.always_active = true;
        self
    }

    /// Parse a `module.toml` body.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let mut manifest: Self = toml::from_str(toml_str)?;
        if manifest.name.is_empty() {
            manifest.name = manifest.slug.clone();
        }
        Ok(manifest)
    }
}

/// Slugs are non-empty lowercase ASCII alphanumerics, `-` and `_`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_defaults() {
        let m = ModuleManifest::from_toml(r#"slug = "billing""#).unwrap();
        assert_eq!(m.name, "billing");
        assert_eq!(m.version, "0.0.0");
        assert!(m.license_required);
        assert!(!m.always_active);
        assert!(m.dependencies.is_empty());
    }

    #[test]
    fn toml_full() {
        let m = ModuleManifest::from_toml(
            r#"
            slug = "notifications"
            name = "Notifications"
            version = "2.1.0"
            dependencies = ["customers", "scheduling"]
            license_required = false
            features_required = ["sms_reminders", "whatsapp"]
            tenant_required = true
            "#,
        )
        .unwrap();
        assert_eq!(m.name, "Notifications");
        assert!(m.dependencies.contains("customers"));
        assert!(!m.license_required);
        assert!(m.features_required.contains(&Feature::SmsReminders));
        assert!(m.features_required.contains(&Feature::Custom("whatsapp".to_string())));
        assert!(m.tenant_required);
    }

    #[test]
    fn slug_rules() {
        assert!(is_valid_slug("multi-location"));
        assert!(is_valid_slug("api_v2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Billing"));
        assert!(!is_valid_slug("../etc"));
    }
}
