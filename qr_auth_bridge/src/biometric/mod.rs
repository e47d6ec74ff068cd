mod config;
mod controller;
mod errors;
mod prompt;
mod types;

pub use controller::BiometricController;
pub use errors::BiometricError;
pub use prompt::{PromptCompletion, SecurePrompt};
pub use types::{
    AuthOutcome, AuthSessionState, Authenticators, Availability, PromptDescriptor,
    UnavailableReason,
};

pub(crate) use controller::SURFACE_DETACHED_REASON;

pub(crate) fn init() -> Result<(), BiometricError> {
    // Resolve the authenticator class early so an invalid value is reported at startup
    let authenticators = *config::BIOMETRIC_AUTHENTICATORS;
    tracing::info!("Biometric authenticators: {:?}", authenticators);
    Ok(())
}
