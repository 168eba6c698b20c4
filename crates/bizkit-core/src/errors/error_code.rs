//! Stable string error codes shared by every error enum.
//! Transport layers map on these, never on `Display` output.

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const CONFIG_PARSE_ERROR: &str = "CONFIG_PARSE_ERROR";
pub const IO_ERROR: &str = "IO_ERROR";
pub const MANIFEST_SOURCE_ERROR: &str = "MANIFEST_SOURCE_ERROR";
pub const FEATURE_NOT_AVAILABLE: &str = "FEATURE_NOT_AVAILABLE";
pub const MODULE_NOT_INSTALLED: &str = "MODULE_NOT_INSTALLED";
pub const INVALID_SLUG: &str = "INVALID_SLUG";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const LEGACY_VALUE_INVALID: &str = "LEGACY_VALUE_INVALID";
pub const CORRUPT_RECORD: &str = "CORRUPT_RECORD";

/// Implemented by every error enum in the workspace.
pub trait BizkitErrorCode {
    fn error_code(&self) -> &'static str;
}
