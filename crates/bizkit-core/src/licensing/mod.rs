//! Licensing & feature gating.
//!
//! ## Components
//! - **features** — closed `Feature` enum plus `Custom` keys for deployment-specific features
//! - **payload** — the externally resolved `LicensePayload`
//! - **plans** — plan name → module set catalog
//! - **gate** — `LicenseGate`: module entitlement with grace window, feature checks

pub mod features;
pub mod gate;
pub mod payload;
pub mod plans;

pub use features::Feature;
pub use gate::{AccessBasis, GateObserver, LicenseGate, ModuleAccess};
pub use payload::LicensePayload;
pub use plans::PlanCatalog;
