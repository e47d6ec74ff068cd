use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qr_auth_bridge::{AuthQrBridge, Capabilities, Surface};

mod sim;

use crate::sim::{LoggingHost, SimCamera, SimDecoder, SimPrompt};

const SCAN_DURATION: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    qr_auth_bridge::init().await?;

    let camera = Arc::new(SimCamera::new(Duration::from_millis(5)));
    let bridge = AuthQrBridge::new(Capabilities {
        prompt: Arc::new(SimPrompt::new(Duration::from_millis(300))),
        camera: camera.clone(),
        decoder: Arc::new(SimDecoder::new(Duration::from_millis(40))),
    });

    bridge.on_attached_to_engine(Arc::new(LoggingHost));
    bridge.on_attached_to_surface(Surface::new("MainActivity"));

    for request in [
        r#"{"method":"isBiometricAvailable"}"#,
        r#"{"method":"authenticate","config":{"title":"Unlock scanner"}}"#,
        r#"{"method":"startScanner"}"#,
    ] {
        let reply = bridge.handle_message(request).await;
        tracing::info!("{} -> {}", request, reply);
    }

    tokio::time::sleep(SCAN_DURATION).await;

    let reply = bridge.handle_message(r#"{"method":"stopScanner"}"#).await;
    tracing::info!("stopScanner -> {}", reply);

    bridge.on_detached_from_surface();
    bridge.on_detached_from_engine();

    tracing::info!(
        "Camera produced {} frames, {} returned to the pool",
        camera.produced(),
        camera.released()
    );
    Ok(())
}
