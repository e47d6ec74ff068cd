use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;

use crate::lifecycle::SurfaceHandle;

use super::errors::BiometricError;
use super::types::{AuthOutcome, Authenticators, Availability, PromptDescriptor};

/// Platform secure-prompt capability (BiometricPrompt, LocalAuthentication, ...)
pub trait SecurePrompt: Send + Sync + 'static {
    /// Current support/enrollment state. Must not block or show UI.
    fn availability(&self, authenticators: Authenticators) -> Availability;

    /// Show the prompt on `surface` and report the result through `completion`.
    ///
    /// Implementations return immediately; the completion may be signalled
    /// from any thread, later or before this call returns.
    fn authenticate(
        &self,
        surface: &SurfaceHandle,
        descriptor: &PromptDescriptor,
        authenticators: Authenticators,
        completion: PromptCompletion,
    );
}

/// Single-resolution completion handle given to [`SecurePrompt::authenticate`]
///
/// Clones share the same slot. The first signal wins; every later signal is
/// rejected with [`BiometricError::AlreadyResolved`] and logged. The settle
/// hook runs exactly once: on the first signal, or when the last clone is
/// dropped unsignalled.
#[derive(Clone)]
pub struct PromptCompletion {
    slot: Arc<Mutex<CompletionSlot>>,
}

type SettleHook = Box<dyn FnOnce() + Send>;

struct CompletionSlot {
    sender: Option<oneshot::Sender<AuthOutcome>>,
    on_settled: Option<SettleHook>,
}

impl Drop for CompletionSlot {
    fn drop(&mut self) {
        if let Some(on_settled) = self.on_settled.take() {
            on_settled();
        }
    }
}

impl std::fmt::Debug for PromptCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptCompletion")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl PromptCompletion {
    pub(super) fn channel(
        on_settled: impl FnOnce() + Send + 'static,
    ) -> (Self, oneshot::Receiver<AuthOutcome>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Arc::new(Mutex::new(CompletionSlot {
                    sender: Some(tx),
                    on_settled: Some(Box::new(on_settled)),
                })),
            },
            rx,
        )
    }

    /// The user authenticated successfully
    pub fn succeeded(&self) -> Result<(), BiometricError> {
        self.resolve(AuthOutcome::Succeeded)
    }

    /// The user was rejected; `None` reports the default failure reason
    pub fn failed(&self, reason: Option<String>) -> Result<(), BiometricError> {
        self.resolve(AuthOutcome::failed(reason))
    }

    /// The prompt could not complete (hardware error, cancellation, lockout)
    pub fn errored(&self, reason: impl Into<String>) -> Result<(), BiometricError> {
        self.resolve(AuthOutcome::Errored(reason.into()))
    }

    pub fn is_resolved(&self) -> bool {
        self.lock_slot().sender.is_none()
    }

    fn resolve(&self, outcome: AuthOutcome) -> Result<(), BiometricError> {
        let (sender, on_settled) = {
            let mut slot = self.lock_slot();
            (slot.sender.take(), slot.on_settled.take())
        };

        let Some(sender) = sender else {
            tracing::error!("Prompt completion resolved twice, rejecting {:?}", outcome);
            return Err(BiometricError::AlreadyResolved);
        };

        // Settle before delivering so the caller never observes a stale session
        if let Some(on_settled) = on_settled {
            on_settled();
        }
        if let Err(outcome) = sender.send(outcome) {
            tracing::debug!(
                "Authentication caller went away before {:?} was delivered",
                outcome
            );
        }
        Ok(())
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, CompletionSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
