use super::error_code::{self, BizkitErrorCode};

/// Errors from lifecycle ledger transitions.
///
/// Any of these means the transition did not happen: stores must never
/// report success on a failed write or leave a half-written record behind.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("module '{slug}' is not installed")]
    NotInstalled { slug: String },

    #[error("invalid module slug '{slug}'")]
    InvalidSlug { slug: String },

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("legacy install flag holds an invalid timestamp: '{value}'")]
    LegacyValueInvalid { value: String },

    #[error("corrupt lifecycle record for '{slug}': {message}")]
    CorruptRecord { slug: String, message: String },
}

impl BizkitErrorCode for LifecycleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotInstalled { .. } => error_code::MODULE_NOT_INSTALLED,
            Self::InvalidSlug { .. } => error_code::INVALID_SLUG,
            Self::Storage { .. } => error_code::STORAGE_ERROR,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::LegacyValueInvalid { .. } => error_code::LEGACY_VALUE_INVALID,
            Self::CorruptRecord { .. } => error_code::CORRUPT_RECORD,
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
