use serde::Serialize;

use super::error_code::{self, BizkitErrorCode};
use crate::licensing::Feature;

/// HTTP "Payment Required". The gate defines the status class only; mapping it
/// onto a real response is the transport's job.
pub const HTTP_PAYMENT_REQUIRED: u16 = 402;

/// Rejections raised by `LicenseGate::ensure_feature`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("feature '{feature}' is not available for module '{module}' under the current license")]
    FeatureNotAvailable { module: String, feature: Feature },
}

/// Structured payload attached to a feature denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureDenialDetails {
    pub module: String,
    pub feature: Feature,
}

impl GateError {
    /// Protocol status class for this rejection.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::FeatureNotAvailable { .. } => HTTP_PAYMENT_REQUIRED,
        }
    }

    pub fn details(&self) -> FeatureDenialDetails {
        match self {
            Self::FeatureNotAvailable { module, feature } => FeatureDenialDetails {
                module: module.clone(),
                feature: feature.clone(),
            },
        }
    }
}

impl BizkitErrorCode for GateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::FeatureNotAvailable { .. } => error_code::FEATURE_NOT_AVAILABLE,
        }
    }
}
