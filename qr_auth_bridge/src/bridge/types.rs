use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::biometric::{AuthOutcome, PromptDescriptor};
use crate::config::BRIDGE_CHANNEL_PREFIX;

pub(super) const BIOMETRIC_API: &str = "BiometricApi";
pub(super) const SCANNER_API: &str = "QRScannerApi";
pub(super) const SCANNER_HOST_API: &str = "QRScannerFlutterApi";

/// Full channel name for one API method, e.g. `dev.flutter.pigeon.qr_auth.BiometricApi.authenticate`
pub fn channel_name(api: &str, method: &str) -> String {
    format!("{}.{}.{}", BRIDGE_CHANNEL_PREFIX.as_str(), api, method)
}

/// Prompt configuration as sent by the host; absent fields take the defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_button_text: Option<String>,
}

impl From<AuthConfig> for PromptDescriptor {
    fn from(config: AuthConfig) -> Self {
        PromptDescriptor::new(config.title, config.subtitle, config.negative_button_text)
    }
}

/// Authentication result in the shape the host expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub success: bool,
    pub error_message: Option<String>,
}

impl From<AuthOutcome> for AuthResult {
    fn from(outcome: AuthOutcome) -> Self {
        match outcome {
            AuthOutcome::Succeeded => Self {
                success: true,
                error_message: None,
            },
            AuthOutcome::Failed(reason) | AuthOutcome::Errored(reason) => Self {
                success: false,
                error_message: Some(reason),
            },
        }
    }
}

/// One host-to-bridge call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum BridgeRequest {
    Authenticate {
        #[serde(default)]
        config: AuthConfig,
    },
    IsBiometricAvailable,
    StartScanner,
    StopScanner,
}

impl BridgeRequest {
    pub fn channel(&self) -> String {
        match self {
            Self::Authenticate { .. } => channel_name(BIOMETRIC_API, "authenticate"),
            Self::IsBiometricAvailable => channel_name(BIOMETRIC_API, "isBiometricAvailable"),
            Self::StartScanner => channel_name(SCANNER_API, "startScanner"),
            Self::StopScanner => channel_name(SCANNER_API, "stopScanner"),
        }
    }
}

/// Reply to one [`BridgeRequest`]: `{"result": ...}` or `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BridgeReply {
    Result(Value),
    Error(String),
}
