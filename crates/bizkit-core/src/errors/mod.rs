//! Error types for every bizkit subsystem.
//!
//! Resolution-time exclusions are never errors: they are reported as data in
//! `ResolvedModuleSet`. Only the conditions below surface as `Err`.

pub mod config_error;
pub mod error_code;
pub mod gate_error;
pub mod lifecycle_error;
pub mod manifest_error;

pub use config_error::ConfigError;
pub use error_code::BizkitErrorCode;
pub use gate_error::{FeatureDenialDetails, GateError};
pub use lifecycle_error::{LifecycleError, LifecycleResult};
pub use manifest_error::{ManifestError, ManifestResult};
