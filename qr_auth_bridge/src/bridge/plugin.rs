use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::biometric::{AuthOutcome, PromptDescriptor};
use crate::lifecycle::{Capabilities, LifecycleCoordinator, Surface};
use crate::scanner::{DetectionCallback, DetectionEvent};

use super::errors::BridgeError;
use super::host::HostMessenger;
use super::types::{
    AuthConfig, AuthResult, BridgeReply, BridgeRequest, SCANNER_HOST_API, channel_name,
};

type SharedHost = Arc<RwLock<Option<Arc<dyn HostMessenger>>>>;

/// Routes host calls to the controllers of the currently attached surface and
/// pushes detections back to the host.
///
/// Engine attachment (the host transport) and surface attachment (the
/// foreground screen) are independent: controllers exist only while a surface
/// is attached, pushes are delivered only while an engine is attached.
pub struct AuthQrBridge {
    coordinator: Mutex<LifecycleCoordinator>,
    host: SharedHost,
    detections: Mutex<Option<mpsc::UnboundedReceiver<DetectionEvent>>>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl AuthQrBridge {
    pub fn new(capabilities: Capabilities) -> Self {
        let host: SharedHost = Arc::new(RwLock::new(None));
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = host.clone();
        // Detections are queued only while an engine is attached
        let on_detected: DetectionCallback = Arc::new(move |event: DetectionEvent| {
            if engine
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .is_none()
            {
                tracing::debug!("No engine attached, dropping detection {:?}", event.value);
                return;
            }
            if tx.send(event).is_err() {
                tracing::trace!("Detection forwarder has exited, dropping detection");
            }
        });

        Self {
            coordinator: Mutex::new(LifecycleCoordinator::new(capabilities, on_detected)),
            host,
            detections: Mutex::new(Some(rx)),
            forwarder: Mutex::new(None),
        }
    }

    /// Install the push target. The first call also starts the detection
    /// forwarder, so it must run inside a tokio runtime.
    pub fn on_attached_to_engine(&self, host: Arc<dyn HostMessenger>) {
        *self.host.write().unwrap_or_else(PoisonError::into_inner) = Some(host);

        let rx = self
            .detections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(rx) = rx {
            let task = tokio::spawn(forward_detections(rx, self.host.clone()));
            *self.forwarder.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        }

        tracing::info!(
            "Bridge attached to engine, pushing to {}",
            channel_name(SCANNER_HOST_API, "onQRCodeDetected")
        );
    }

    /// Remove the push target; later detections are dropped until the next attach
    pub fn on_detached_from_engine(&self) {
        *self.host.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!("Bridge detached from engine");
    }

    pub fn on_attached_to_surface(&self, surface: Surface) {
        self.lock_coordinator().on_attached(surface);
    }

    pub fn on_detached_from_surface(&self) {
        self.lock_coordinator().on_detached();
    }

    pub fn on_detached_from_surface_for_config_changes(&self) {
        self.lock_coordinator().on_detached_for_config_changes();
    }

    pub fn on_reattached_to_surface_for_config_changes(&self, surface: Surface) {
        self.lock_coordinator()
            .on_reattached_for_config_changes(surface);
    }

    /// Run one authentication on the attached surface.
    ///
    /// The call runs on its own task; a panic inside the controller or the
    /// prompt comes back as [`BridgeError::Transport`].
    pub async fn authenticate(&self, config: AuthConfig) -> Result<AuthOutcome, BridgeError> {
        let controller = self
            .lock_coordinator()
            .biometric()
            .ok_or_else(|| BridgeError::NotAttached.log())?;

        let descriptor = PromptDescriptor::from(config);
        let outcome =
            tokio::spawn(async move { controller.authenticate(descriptor).await }).await??;
        Ok(outcome)
    }

    pub fn is_biometric_available(&self) -> bool {
        self.lock_coordinator()
            .biometric()
            .is_some_and(|controller| controller.is_available())
    }

    pub async fn start_scanner(&self) -> Result<(), BridgeError> {
        let scanner = self
            .lock_coordinator()
            .scanner()
            .ok_or_else(|| BridgeError::NotAttached.log())?;

        tokio::spawn(async move { scanner.start().await }).await??;
        Ok(())
    }

    pub fn stop_scanner(&self) -> Result<(), BridgeError> {
        match self.lock_coordinator().scanner() {
            Some(scanner) => scanner.stop(),
            None => tracing::debug!("stopScanner without an attached surface"),
        }
        Ok(())
    }

    /// Execute one decoded host request
    pub async fn dispatch(&self, request: BridgeRequest) -> BridgeReply {
        let channel = request.channel();
        tracing::debug!("Handling {}", channel);

        match request {
            BridgeRequest::Authenticate { config } => {
                into_reply(self.authenticate(config).await.map(AuthResult::from))
            }
            BridgeRequest::IsBiometricAvailable => into_reply(Ok(self.is_biometric_available())),
            BridgeRequest::StartScanner => into_reply(self.start_scanner().await),
            BridgeRequest::StopScanner => into_reply(self.stop_scanner()),
        }
    }

    /// Parse a JSON request, dispatch it and serialize the reply.
    /// Malformed input produces an error reply.
    pub async fn handle_message(&self, message: &str) -> String {
        let reply = match serde_json::from_str::<BridgeRequest>(message) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                BridgeReply::Error(BridgeError::InvalidRequest(e.to_string()).log().to_string())
            }
        };

        serde_json::to_string(&reply).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize reply: {}", e);
            json!({ "error": e.to_string() }).to_string()
        })
    }

    fn lock_coordinator(&self) -> MutexGuard<'_, LifecycleCoordinator> {
        self.coordinator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AuthQrBridge {
    fn drop(&mut self) {
        let forwarder = self
            .forwarder
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = forwarder {
            task.abort();
        }
    }
}

fn into_reply<T: Serialize>(result: Result<T, BridgeError>) -> BridgeReply {
    let value = result.and_then(|value| {
        serde_json::to_value(value).map_err(|e| BridgeError::Transport(e.to_string()))
    });
    match value {
        Ok(value) => BridgeReply::Result(value),
        Err(e) => BridgeReply::Error(e.to_string()),
    }
}

/// Deliver detections to the host in arrival order, off the analysis worker
async fn forward_detections(mut rx: mpsc::UnboundedReceiver<DetectionEvent>, host: SharedHost) {
    while let Some(event) = rx.recv().await {
        let target = host.read().unwrap_or_else(PoisonError::into_inner).clone();
        match target {
            Some(target) => {
                tracing::trace!("Pushing detection to host");
                target.on_qr_code_detected(event.value);
            }
            None => tracing::debug!("No engine attached, dropping detection {:?}", event.value),
        }
    }
    tracing::debug!("Detection forwarder exited");
}
