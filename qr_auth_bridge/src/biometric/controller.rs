use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::lifecycle::SurfaceHandle;

use super::config::BIOMETRIC_AUTHENTICATORS;
use super::errors::BiometricError;
use super::prompt::{PromptCompletion, SecurePrompt};
use super::types::{AuthOutcome, AuthSessionState, Authenticators, Availability, PromptDescriptor};

pub(crate) const SURFACE_DETACHED_REASON: &str = "Authentication surface detached";

/// Runs one secure-prompt interaction at a time and turns its callback into an awaitable outcome
pub struct BiometricController {
    prompt: Arc<dyn SecurePrompt>,
    surface: SurfaceHandle,
    authenticators: Authenticators,
    state: Arc<Mutex<AuthSessionState>>,
}

/// Returns the controller to Idle when dropped. Once the prompt is shown the
/// guard belongs to its completion, so a cancelled caller cannot reopen the
/// session while the prompt is still on screen.
struct InFlightGuard {
    state: Arc<Mutex<AuthSessionState>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = AuthSessionState::Idle;
    }
}

impl BiometricController {
    pub fn new(prompt: Arc<dyn SecurePrompt>, surface: SurfaceHandle) -> Self {
        Self::with_authenticators(prompt, surface, *BIOMETRIC_AUTHENTICATORS)
    }

    pub fn with_authenticators(
        prompt: Arc<dyn SecurePrompt>,
        surface: SurfaceHandle,
        authenticators: Authenticators,
    ) -> Self {
        Self {
            prompt,
            surface,
            authenticators,
            state: Arc::new(Mutex::new(AuthSessionState::Idle)),
        }
    }

    pub fn state(&self) -> AuthSessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn availability(&self) -> Availability {
        self.prompt.availability(self.authenticators)
    }

    pub fn is_available(&self) -> bool {
        self.availability().is_available()
    }

    /// Show the secure prompt once and wait for its single outcome.
    ///
    /// Availability is not checked here; an unavailable capability reports
    /// through an `Errored` outcome. A call made while another is in flight is
    /// rejected with [`BiometricError::InFlight`]; the session stays in flight
    /// until the prompt signals or drops its completion, even if this future
    /// is dropped first. If the surface detaches before the prompt answers,
    /// the call resolves `Errored`.
    pub async fn authenticate(
        &self,
        descriptor: PromptDescriptor,
    ) -> Result<AuthOutcome, BiometricError> {
        let guard = self.begin()?;
        let call_id = Uuid::new_v4();

        if !self.surface.is_attached() {
            tracing::warn!(
                "Authentication {} requested on detached surface {}",
                call_id,
                self.surface.id()
            );
            return Ok(AuthOutcome::Errored(SURFACE_DETACHED_REASON.to_string()));
        }

        tracing::debug!(
            "Authentication {} started on surface {}: {:?}",
            call_id,
            self.surface.id(),
            descriptor
        );

        let (completion, outcome_rx) = PromptCompletion::channel(move || drop(guard));
        self.prompt
            .authenticate(&self.surface, &descriptor, self.authenticators, completion);

        let outcome = tokio::select! {
            biased;
            received = outcome_rx => match received {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::error!("Authentication {} abandoned by the prompt", call_id);
                    return Err(BiometricError::PromptAbandoned);
                }
            },
            () = self.surface.detached() => {
                tracing::warn!(
                    "Surface {} detached while authentication {} was in flight",
                    self.surface.id(),
                    call_id
                );
                AuthOutcome::Errored(SURFACE_DETACHED_REASON.to_string())
            }
        };

        tracing::debug!("Authentication {} finished: {:?}", call_id, outcome);
        Ok(outcome)
    }

    fn begin(&self) -> Result<InFlightGuard, BiometricError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == AuthSessionState::InFlight {
            tracing::warn!("Rejecting authentication: another request is in flight");
            return Err(BiometricError::InFlight);
        }
        *state = AuthSessionState::InFlight;
        Ok(InFlightGuard {
            state: self.state.clone(),
        })
    }
}
