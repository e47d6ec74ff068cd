use thiserror::Error;

/// Errors that can occur while driving the camera and the analysis stage
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScannerError {
    /// The camera capability is missing or could not be acquired
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    /// Binding or unbinding camera use cases was rejected
    #[error("Binding error: {0}")]
    Binding(String),

    /// The decoder failed on a frame
    #[error("Decode error: {0}")]
    Decode(String),

    /// Frame metadata could not be turned into a decoder input
    #[error("Invalid frame: {0}")]
    Frame(String),

    /// The operation does not fit the current scan session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Surface detached")]
    SurfaceDetached,

    /// `stop()` was called while the camera provider was still being acquired
    #[error("Scanner stopped before it finished starting")]
    StartAborted,
}
