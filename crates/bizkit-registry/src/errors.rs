//! Registry error type. Exclusions are reported in `ResolvedModuleSet`;
//! only a failing manifest source or ledger surfaces here.

use bizkit_core::errors::{BizkitErrorCode, LifecycleError, ManifestError};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl BizkitErrorCode for RegistryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Manifest(e) => e.error_code(),
            Self::Lifecycle(e) => e.error_code(),
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
