//! # bizkit-registry
//!
//! Orchestrates a boot pass: persisted active slugs → manifests → license
//! gate → dependency resolution → instantiate and boot exactly the allowed
//! modules, dependencies first.

pub mod boot_order;
pub mod errors;
pub mod module;
pub mod registry;
pub mod status;

pub use boot_order::{boot_order, BootPlan};
pub use errors::{RegistryError, RegistryResult};
pub use module::{BootContext, Module, ModuleFactories};
pub use registry::ModuleRegistry;
pub use status::ModuleStatusEntry;
