//! Programming-contract errors.
//!
//! DESIGN
//! ======
//! Only host-code misuse surfaces as an `Err`: double registration,
//! interacting with a mode before it is started, unknown mode names,
//! duplicate or malformed feature ids, and mutations of absent features.
//! Geometric rejection (self-intersection, malformed coordinates, a failed
//! custom validator) is never an error; it is reported through
//! [`crate::validate::ValidationResult`] or silently dropped by the mode.

use crate::geometry::FeatureId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("mode {0} is already registered")]
    ModeAlreadyRegistered(String),
    #[error("mode {0} is not registered")]
    ModeNotRegistered(String),
    #[error("mode {0} must be started before it receives input")]
    ModeNotStarted(String),
    #[error("mode {mode} cannot move from {from} to {to}")]
    InvalidLifecycle { mode: String, from: &'static str, to: &'static str },
    #[error("no mode named {0}")]
    ModeNotFound(String),
    #[error("mode {0} is registered twice")]
    DuplicateMode(String),
    #[error("feature id already exists: {0}")]
    DuplicateId(FeatureId),
    #[error("feature id rejected by the id strategy: {0}")]
    InvalidId(FeatureId),
    #[error("feature not found: {0}")]
    FeatureNotFound(FeatureId),
    #[error("draw instance is not enabled; call start() first")]
    NotEnabled,
    #[error("no select mode is registered")]
    NoSelectMode,
}

impl DrawError {
    /// Stable machine-readable code for hosts that surface errors.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ModeAlreadyRegistered(_) => "E_MODE_ALREADY_REGISTERED",
            Self::ModeNotRegistered(_) => "E_MODE_NOT_REGISTERED",
            Self::ModeNotStarted(_) => "E_MODE_NOT_STARTED",
            Self::InvalidLifecycle { .. } => "E_INVALID_LIFECYCLE",
            Self::ModeNotFound(_) => "E_MODE_NOT_FOUND",
            Self::DuplicateMode(_) => "E_DUPLICATE_MODE",
            Self::DuplicateId(_) => "E_DUPLICATE_ID",
            Self::InvalidId(_) => "E_INVALID_ID",
            Self::FeatureNotFound(_) => "E_FEATURE_NOT_FOUND",
            Self::NotEnabled => "E_NOT_ENABLED",
            Self::NoSelectMode => "E_NO_SELECT_MODE",
        }
    }
}
