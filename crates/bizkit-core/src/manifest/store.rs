//! ManifestStore — memoized manifest lookup.
//!
//! The cache is owned by the store instance, not shared process-wide: two
//! stores over different sources never see each other's manifests. Loading
//! goes through Moka's `try_get_with`, so concurrent first calls trigger a
//! single source load.

use std::collections::BTreeMap;
use std::sync::Arc;

use moka::sync::Cache;
use tracing::{debug, warn};

use crate::config::ManifestConfig;
use crate::errors::{ManifestError, ManifestResult};

use super::source::{ManifestSource, TomlDirManifestSource};
use super::types::{is_valid_slug, ModuleManifest};

/// Slug → manifest, ordered by slug.
pub type ManifestMap = BTreeMap<String, Arc<ModuleManifest>>;

/// Single cache slot: the whole map is loaded and invalidated as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AllManifests;

pub struct ManifestStore {
    source: Arc<dyn ManifestSource>,
    cache: Cache<AllManifests, Arc<ManifestMap>>,
}

impl ManifestStore {
    pub fn new(source: Arc<dyn ManifestSource>) -> Self {
        Self {
            source,
            cache: Cache::builder().initial_capacity(1).build(),
        }
    }

    /// Store over a TOML manifest directory as configured.
    pub fn from_config(config: &ManifestConfig) -> Self {
        Self::new(Arc::new(TomlDirManifestSource::new(
            std::path::Path::new(&config.dir),
            &config.file_name,
        )))
    }

    /// All manifests, loading the source on first use.
    pub fn get_all(&self) -> ManifestResult<Arc<ManifestMap>> {
        self.cache
            .try_get_with(AllManifests, || self.load())
            .map_err(|e: Arc<ManifestError>| (*e).clone())
    }

    /// `Ok(None)` means no such module is installed. That is a normal
    /// outcome, not an error.
    pub fn get_manifest(&self, slug: &str) -> ManifestResult<Option<Arc<ModuleManifest>>> {
        Ok(self.get_all()?.get(slug).cloned())
    }

    /// Drop the memoized manifests; the next lookup reloads the source.
    pub fn reset_cache(&self) {
        self.cache.invalidate(&AllManifests);
    }

    fn load(&self) -> ManifestResult<Arc<ManifestMap>> {
        let manifests = self.source.load()?;
        let mut map = ManifestMap::new();

        for manifest in manifests {
            if !is_valid_slug(&manifest.slug) {
                warn!(slug = %manifest.slug, "skipping manifest with invalid slug");
                continue;
            }
            if map.contains_key(&manifest.slug) {
                warn!(slug = %manifest.slug, "duplicate manifest ignored, keeping the first");
                continue;
            }
            map.insert(manifest.slug.clone(), Arc::new(manifest));
        }

        debug!(count = map.len(), "manifests loaded");
        Ok(Arc::new(map))
    }
}
