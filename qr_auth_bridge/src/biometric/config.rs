use std::{env, sync::LazyLock};

use super::types::Authenticators;

pub(super) static BIOMETRIC_AUTHENTICATORS: LazyLock<Authenticators> =
    LazyLock::new(|| parse_authenticators(env::var("BIOMETRIC_AUTHENTICATORS").ok()));

fn parse_authenticators(value: Option<String>) -> Authenticators {
    match value {
        None => Authenticators::BiometricStrong,
        Some(v) => match v.to_lowercase().as_str() {
            "strong" => Authenticators::BiometricStrong,
            "weak" => Authenticators::BiometricWeak,
            "device_credential" => Authenticators::DeviceCredential,
            invalid => {
                tracing::warn!(
                    "Invalid biometric authenticators: {}. Using default 'strong'",
                    invalid
                );
                Authenticators::BiometricStrong
            }
        },
    }
}
