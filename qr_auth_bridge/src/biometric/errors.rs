use thiserror::Error;

/// Errors raised by the authentication session controller.
///
/// Negative prompt results (mismatch, cancellation, lockout) are not errors;
/// they are reported as [`AuthOutcome`](super::AuthOutcome) values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BiometricError {
    /// Another authentication call is still waiting for its prompt
    #[error("An authentication request is already in flight")]
    InFlight,

    /// The prompt completion was signalled more than once
    #[error("Prompt completion already resolved")]
    AlreadyResolved,

    /// The prompt capability released its completion without signalling
    #[error("Authentication prompt ended without a result")]
    PromptAbandoned,
}
