//! Configuration loaded from `bizkit.toml`.

pub mod licensing_config;
pub mod manifest_config;
pub mod observability_config;
pub mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub use licensing_config::LicensingConfig;
pub use manifest_config::ManifestConfig;
pub use observability_config::ObservabilityConfig;
pub use storage_config::StorageConfig;

/// Environment variable that forces license bypass on (`1`/`true`) or off (`0`/`false`).
pub const DEV_MODE_ENV: &str = "BIZKIT_DEV_MODE";

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BizkitConfig {
    pub licensing: LicensingConfig,
    pub manifests: ManifestConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

impl BizkitConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Apply environment overrides (currently only `BIZKIT_DEV_MODE`).
    pub fn apply_env_overrides(&mut self) {
        self.apply_dev_mode_override(std::env::var(DEV_MODE_ENV).ok().as_deref());
    }

    fn apply_dev_mode_override(&mut self, value: Option<&str>) {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("1") | Some("true") | Some("yes") => self.licensing.dev_mode = true,
            Some("0") | Some("false") | Some("no") => self.licensing.dev_mode = false,
            _ => {}
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.licensing.grace_period_days > licensing_config::MAX_GRACE_PERIOD_DAYS {
            return Err(ConfigError::InvalidValue {
                key: "licensing.grace_period_days".to_string(),
                message: format!(
                    "must be at most {}",
                    licensing_config::MAX_GRACE_PERIOD_DAYS
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = BizkitConfig::from_toml("").unwrap();
        assert_eq!(config, BizkitConfig::default());
        assert_eq!(
            config.licensing.grace_period_days,
            licensing_config::DEFAULT_GRACE_PERIOD_DAYS
        );
        assert!(!config.licensing.dev_mode);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = BizkitConfig::from_toml(
            r#"
            [licensing]
            grace_period_days = 30

            [licensing.plans]
            solo = ["scheduling"]

            [storage]
            db_path = "/var/lib/bizkit/ledger.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.licensing.grace_period_days, 30);
        assert_eq!(
            config.licensing.plans.get("solo").unwrap(),
            &vec!["scheduling".to_string()]
        );
        assert_eq!(config.storage.db_path, "/var/lib/bizkit/ledger.db");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn oversized_grace_period_rejected() {
        let err = BizkitConfig::from_toml("[licensing]\ngrace_period_days = 100000").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn dev_mode_override_parsing() {
        let mut config = BizkitConfig::default();
        config.apply_dev_mode_override(Some("TRUE"));
        assert!(config.licensing.dev_mode);
        config.apply_dev_mode_override(Some("garbage"));
        assert!(config.licensing.dev_mode);
        config.apply_dev_mode_override(Some("0"));
        assert!(!config.licensing.dev_mode);
        config.apply_dev_mode_override(None);
        assert!(!config.licensing.dev_mode);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BizkitConfig::from_file(&dir.path().join("bizkit.toml")).unwrap();
        assert_eq!(config, BizkitConfig::default());
    }
}
