//! Error types for the bridge API surface

use thiserror::Error;

use crate::biometric::BiometricError;
use crate::scanner::ScannerError;

/// Errors returned to the host across the bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// No foreground surface is attached, so no controller exists
    #[error("No foreground surface is attached")]
    NotAttached,

    /// The host sent a request the bridge could not parse
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The controller call itself failed (e.g. panicked) before producing a result
    #[error("Transport error: {0}")]
    Transport(String),

    /// Error from the authentication session controller
    #[error("Biometric error: {0}")]
    Biometric(BiometricError),

    /// Error from the scan pipeline controller
    #[error("Scanner error: {0}")]
    Scanner(ScannerError),
}

impl BridgeError {
    /// Log the error and return self
    ///
    /// This method logs the error with appropriate context and returns self,
    /// allowing for method chaining and explicit logging when needed.
    pub fn log(self) -> Self {
        match &self {
            Self::NotAttached => tracing::error!("No foreground surface is attached"),
            Self::InvalidRequest(msg) => tracing::error!("Invalid request: {}", msg),
            Self::Transport(msg) => tracing::error!("Transport error: {}", msg),
            Self::Biometric(err) => tracing::error!("Biometric error: {}", err),
            Self::Scanner(err) => tracing::error!("Scanner error: {}", err),
        }
        self
    }
}

// Custom From implementations that automatically log errors

impl From<BiometricError> for BridgeError {
    fn from(err: BiometricError) -> Self {
        let error = Self::Biometric(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<ScannerError> for BridgeError {
    fn from(err: ScannerError) -> Self {
        let error = Self::Scanner(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<tokio::task::JoinError> for BridgeError {
    fn from(err: tokio::task::JoinError) -> Self {
        let error = Self::Transport(err.to_string());
        tracing::error!("{}", error);
        error
    }
}
