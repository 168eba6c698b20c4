//! # bizkit-core
//!
//! Foundation crate for the bizkit module engine.
//! Defines manifests, license gating, dependency resolution, the lifecycle
//! ledger contract, errors, config, and tracing setup. The storage and
//! registry crates build on top of it.

pub mod audit;
pub mod clock;
pub mod config;
pub mod errors;
pub mod licensing;
pub mod lifecycle;
pub mod manifest;
pub mod resolver;
pub mod tracing;

// Re-export the most commonly used types at the crate root.
pub use audit::{AuditEvent, AuditSink, TracingAuditSink};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::BizkitConfig;
pub use errors::error_code::BizkitErrorCode;
pub use licensing::{Feature, LicenseGate, LicensePayload, ModuleAccess};
pub use lifecycle::{LifecycleStore, ModuleLifecycleRecord, ModuleStatus};
pub use manifest::{ManifestStore, ModuleManifest};
pub use resolver::{resolve, ExclusionReason, LicenseDecision, ResolvedModuleSet};
