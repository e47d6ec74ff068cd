//! Central configuration for the qr_auth_bridge crate

use std::sync::LazyLock;

/// Prefix for every message channel the bridge listens on
///
/// Channel names are built as `{prefix}.{Api}.{method}`.
/// Default: "dev.flutter.pigeon.qr_auth"
pub static BRIDGE_CHANNEL_PREFIX: LazyLock<String> = LazyLock::new(|| {
    std::env::var("BRIDGE_CHANNEL_PREFIX")
        .unwrap_or_else(|_| "dev.flutter.pigeon.qr_auth".to_string())
});
