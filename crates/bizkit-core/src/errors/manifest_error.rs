use super::error_code::{self, BizkitErrorCode};

/// Failures of a manifest source as a whole.
///
/// A single broken `module.toml` is not an error: that module is skipped and
/// simply treated as not installed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest source unavailable: {message}")]
    SourceUnavailable { message: String },

    #[error("invalid module slug '{slug}'")]
    InvalidSlug { slug: String },
}

impl BizkitErrorCode for ManifestError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => error_code::MANIFEST_SOURCE_ERROR,
            Self::InvalidSlug { .. } => error_code::INVALID_SLUG,
        }
    }
}

pub type ManifestResult<T> = Result<T, ManifestError>;
