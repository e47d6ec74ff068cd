/// Surface and engine lifecycle as seen from the host
use crate::common::{ChannelHost, PromptAnswer, TestBridge};
use qr_auth_bridge::{BRIDGE_CHANNEL_PREFIX, Surface, channel_name};
use serde_json::json;
use serial_test::serial;

#[tokio::test]
async fn test_surface_detach_stops_scanner() {
    let mut t = TestBridge::start(PromptAnswer::Success);
    t.bridge.start_scanner().await.expect("start");

    t.bridge.on_detached_from_surface();

    // The camera is unbound and the analyzer refuses frames
    assert_eq!(t.camera.unbind_count(), 2);
    assert!(!t.camera.capture("GONE"));
    assert!(t.drain_pushes().await.is_empty());

    // Scanner calls without a surface
    assert_eq!(
        t.call(json!({"method": "startScanner"})).await,
        json!({"error": "No foreground surface is attached"})
    );
    assert_eq!(
        t.call(json!({"method": "stopScanner"})).await,
        json!({"result": null})
    );
}

/// A reconfigured surface gets fresh controllers; nothing is resumed automatically
#[tokio::test]
async fn test_config_change_requires_new_start() {
    let mut t = TestBridge::start(PromptAnswer::Success);
    t.bridge.start_scanner().await.expect("start");

    t.bridge.on_detached_from_surface_for_config_changes();
    t.bridge
        .on_reattached_to_surface_for_config_changes(Surface::new("MainActivity"));

    assert!(!t.camera.capture("BEFORE"));

    t.bridge.start_scanner().await.expect("start on new surface");
    assert!(t.camera.capture("AFTER"));
    assert_eq!(t.next_push().await, Some("AFTER".to_string()));
}

#[tokio::test]
async fn test_engine_detach_drops_pushes() {
    let mut t = TestBridge::start(PromptAnswer::Success);
    t.bridge.start_scanner().await.expect("start");

    // With no engine, detections go nowhere
    t.bridge.on_detached_from_engine();
    assert!(t.camera.capture("DROPPED"));
    assert!(t.drain_pushes().await.is_empty());

    // A new engine receives later detections
    let (host, mut pushes) = ChannelHost::new();
    t.bridge.on_attached_to_engine(host);
    assert!(t.camera.capture("DELIVERED"));
    let pushed = tokio::time::timeout(std::time::Duration::from_secs(2), pushes.recv())
        .await
        .ok()
        .flatten();
    assert_eq!(pushed, Some("DELIVERED".to_string()));
}

#[tokio::test]
#[serial]
async fn test_init_and_channel_names() {
    let _t = TestBridge::start(PromptAnswer::Success);

    qr_auth_bridge::init().await.expect("init");

    assert_eq!(
        channel_name("BiometricApi", "authenticate"),
        format!("{}.BiometricApi.authenticate", BRIDGE_CHANNEL_PREFIX.as_str())
    );
    assert_eq!(BRIDGE_CHANNEL_PREFIX.as_str(), "dev.flutter.pigeon.qr_auth");
}
