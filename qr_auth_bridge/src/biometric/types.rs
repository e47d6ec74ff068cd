use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_PROMPT_TITLE: &str = "Biometric Authentication";
pub(crate) const DEFAULT_PROMPT_SUBTITLE: &str = "Please authenticate to continue";
pub(crate) const DEFAULT_DISMISS_LABEL: &str = "Cancel";
pub(crate) const DEFAULT_FAILURE_REASON: &str = "Authentication failed";

/// Text shown on the secure prompt for one authentication call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDescriptor {
    pub title: String,
    pub subtitle: String,
    pub dismiss_label: String,
}

impl PromptDescriptor {
    /// Build a descriptor, applying the defaults for exactly the absent fields
    pub fn new(
        title: Option<String>,
        subtitle: Option<String>,
        dismiss_label: Option<String>,
    ) -> Self {
        Self {
            title: title.unwrap_or_else(|| DEFAULT_PROMPT_TITLE.to_string()),
            subtitle: subtitle.unwrap_or_else(|| DEFAULT_PROMPT_SUBTITLE.to_string()),
            dismiss_label: dismiss_label.unwrap_or_else(|| DEFAULT_DISMISS_LABEL.to_string()),
        }
    }
}

impl Default for PromptDescriptor {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

/// Result of one authentication call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum AuthOutcome {
    Succeeded,
    /// The user was rejected (e.g. biometric mismatch)
    Failed(String),
    /// The prompt could not complete (hardware error, cancellation, lockout)
    Errored(String),
}

impl AuthOutcome {
    pub(crate) fn failed(reason: Option<String>) -> Self {
        Self::Failed(reason.unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string()))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Succeeded => None,
            Self::Failed(reason) | Self::Errored(reason) => Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthSessionState {
    Idle,
    InFlight,
}

/// Authenticator class the prompt and availability query are evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authenticators {
    BiometricStrong,
    BiometricWeak,
    DeviceCredential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    NoHardware,
    HardwareUnavailable,
    NoneEnrolled,
    SecurityUpdateRequired,
    Unsupported,
}

/// Support and enrollment state of the secure prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable(UnavailableReason),
    /// The platform could not tell; treated as not available
    Unknown,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}
