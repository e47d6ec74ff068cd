//! qr_auth_bridge - Biometric authentication and QR scanning bridge
//!
//! This crate exposes two device capabilities to a host application over an
//! asynchronous message-passing boundary: a single-flight biometric prompt and
//! a continuous camera scan pipeline with latest-frame-only backpressure.
//!
//! Platform specifics (the secure prompt, the camera driver, the barcode
//! decoder and the host transport) are plugged in through traits.

mod biometric;
mod bridge;
mod config;
mod lifecycle;
mod scanner;

#[cfg(test)]
mod test_utils;

// Re-export the bridge facade
pub use bridge::{
    AuthConfig, AuthQrBridge, AuthResult, BridgeError, BridgeReply, BridgeRequest, HostMessenger,
    channel_name,
};

pub use config::BRIDGE_CHANNEL_PREFIX;

pub use biometric::{
    AuthOutcome, AuthSessionState, Authenticators, Availability, BiometricController,
    BiometricError, PromptCompletion, PromptDescriptor, SecurePrompt, UnavailableReason,
};

pub use lifecycle::{Capabilities, Surface, SurfaceHandle, SurfaceId};

pub use scanner::{
    CameraCapability, CameraProvider, Decoder, DetectionCallback, DetectionEvent, Frame,
    FrameImage, FrameSink, InputImage, LensFacing, Rotation, ScanController, ScanSessionState,
    ScannerError,
};

/// Initialize the bridge configuration
///
/// Resolves every environment-driven setting up front so that misconfiguration
/// is reported at startup rather than on the first host call.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let prefix = config::BRIDGE_CHANNEL_PREFIX.as_str();
    tracing::info!("Bridge channel prefix: {}", prefix);

    biometric::init()?;
    scanner::init()?;
    Ok(())
}
