//! Manifest discovery configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManifestConfig {
    /// Directory holding one `<slug>/module.toml` per module. Default: "modules".
    pub dir: String,
    /// File name looked up inside each module directory. Default: "module.toml".
    pub file_name: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            dir: "modules".to_string(),
            file_name: "module.toml".to_string(),
        }
    }
}
