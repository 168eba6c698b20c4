//! Manifest sources. The engine only consumes the mapping they produce.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{ManifestError, ManifestResult};

use super::types::ModuleManifest;

pub trait ManifestSource: Send + Sync {
    fn load(&self) -> ManifestResult<Vec<ModuleManifest>>;
}

/// Fixed, in-memory manifest list.
#[derive(Debug, Clone, Default)]
pub struct StaticManifestSource {
    manifests: Vec<ModuleManifest>,
}

impl StaticManifestSource {
    pub fn new(manifests: Vec<ModuleManifest>) -> Self {
        Self { manifests }
    }
}

impl ManifestSource for StaticManifestSource {
    fn load(&self) -> ManifestResult<Vec<ModuleManifest>> {
        Ok(self.manifests.clone())
    }
}

/// Reads `<dir>/<slug>/<file_name>` for every subdirectory of `dir`.
///
/// A missing root directory means no modules are installed. A single
/// unreadable or malformed manifest is skipped with a warning; that module
/// is then simply absent.
#[derive(Debug, Clone)]
pub struct TomlDirManifestSource {
    dir: PathBuf,
    file_name: String,
}

impl TomlDirManifestSource {
    pub fn new(dir: &Path, file_name: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            file_name: file_name.to_string(),
        }
    }

    fn read_one(&self, module_dir: &Path) -> Option<ModuleManifest> {
        let dir_slug = module_dir.file_name()?.to_str()?.to_string();
        let path = module_dir.join(&self.file_name);
        if !path.is_file() {
            debug!(dir = %module_dir.display(), "no manifest file, skipping");
            return None;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read module manifest");
                return None;
            }
        };

        let mut manifest = match ModuleManifest::from_toml(&content) {
            Ok(m) => m,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed module manifest");
                return None;
            }
        };

        if manifest.slug.is_empty() {
            manifest.slug = dir_slug;
            if manifest.name.is_empty() {
                manifest.name = manifest.slug.clone();
            }
        } else if manifest.slug != dir_slug {
            warn!(
                path = %path.display(),
                declared = %manifest.slug,
                directory = %dir_slug,
                "manifest slug does not match its directory"
            );
            return None;
        }

        Some(manifest)
    }
}

impl ManifestSource for TomlDirManifestSource {
    fn load(&self) -> ManifestResult<Vec<ModuleManifest>> {
        if !self.dir.exists() {
            debug!(dir = %self.dir.display(), "manifest directory missing, no modules installed");
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| ManifestError::SourceUnavailable {
            message: format!("cannot list {}: {e}", self.dir.display()),
        })?;

        let mut module_dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        module_dirs.sort();

        Ok(module_dirs
            .iter()
            .filter_map(|dir| self.read_one(dir))
            .collect())
    }
}
