//! Error types for pinning registration and engine lifecycle.
//!
//! Validation failures on the challenge path are deliberately *not* errors:
//! they are [`crate::validator::PinValidation`] values that always resolve
//! to a trust disposition. Errors here surface only at registration time.

use thiserror::Error;

/// Errors surfaced to the initializer.
#[derive(Debug, Error)]
pub enum PinningError {
    /// A policy failed validation at registration. Nothing was applied.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// What was wrong, including the offending hostname where relevant.
        message: String,
    },

    /// The process-wide shared engine was already initialized.
    #[error("Pinning engine is already initialized for this process")]
    AlreadyInitialized,
}

impl PinningError {
    /// Build a `ConfigError` for `hostname` with a reason.
    pub(crate) fn config_for(hostname: &str, reason: impl Into<String>) -> Self {
        PinningError::ConfigError {
            message: format!("{}: {}", hostname, reason.into()),
        }
    }
}
