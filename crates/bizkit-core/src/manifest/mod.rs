//! Module manifests: declared metadata, where it comes from, and the cache.
//!
//! ## Components
//! - **types** — `ModuleManifest` and slug validation
//! - **source** — `ManifestSource` trait with static and TOML-directory sources
//! - **store** — `ManifestStore`, the memoized, explicitly reset lookup

pub mod source;
pub mod store;
pub mod types;

pub use source::{ManifestSource, StaticManifestSource, TomlDirManifestSource};
pub use store::{ManifestMap, ManifestStore};
pub use types::{is_valid_slug, ModuleManifest};
