use std::sync::Arc;

use crate::biometric::{BiometricController, SecurePrompt};
use crate::scanner::{CameraCapability, Decoder, DetectionCallback, ScanController};

use super::surface::Surface;

/// Platform capabilities the controllers are built from on every attach
#[derive(Clone)]
pub struct Capabilities {
    pub prompt: Arc<dyn SecurePrompt>,
    pub camera: Arc<dyn CameraCapability>,
    pub decoder: Arc<dyn Decoder>,
}

struct AttachedSurface {
    surface: Surface,
    biometric: Arc<BiometricController>,
    scanner: Arc<ScanController>,
}

/// Ties both controllers to the attach/detach cycle of the host's foreground surface
pub struct LifecycleCoordinator {
    capabilities: Capabilities,
    on_detected: DetectionCallback,
    attached: Option<AttachedSurface>,
}

impl LifecycleCoordinator {
    pub fn new(capabilities: Capabilities, on_detected: DetectionCallback) -> Self {
        Self {
            capabilities,
            on_detected,
            attached: None,
        }
    }

    /// Take ownership of a newly attached surface and build fresh controllers for it
    pub fn on_attached(&mut self, surface: Surface) {
        if self.attached.is_some() {
            tracing::debug!("New surface attached before the previous one detached");
            self.on_detached();
        }

        let handle = surface.handle();
        let biometric = Arc::new(BiometricController::new(
            self.capabilities.prompt.clone(),
            handle.clone(),
        ));
        let scanner = Arc::new(ScanController::new(
            self.capabilities.camera.clone(),
            self.capabilities.decoder.clone(),
            handle,
            self.on_detected.clone(),
        ));

        tracing::info!("Surface {} ({}) attached", surface.name(), surface.id());
        self.attached = Some(AttachedSurface {
            surface,
            biometric,
            scanner,
        });
    }

    /// Stop the scanner, then mark the surface detached and drop the controllers.
    ///
    /// Does not wait for in-flight work; an authentication waiting on the
    /// prompt observes the detach and resolves on its own.
    pub fn on_detached(&mut self) {
        let Some(attached) = self.attached.take() else {
            tracing::trace!("Detach without an attached surface");
            return;
        };

        attached.scanner.stop();
        attached.surface.detach();
        tracing::info!(
            "Surface {} ({}) detached",
            attached.surface.name(),
            attached.surface.id()
        );
    }

    pub fn on_detached_for_config_changes(&mut self) {
        self.on_detached();
    }

    /// Controller state from before the reconfiguration is not reused
    pub fn on_reattached_for_config_changes(&mut self, surface: Surface) {
        self.on_attached(surface);
    }

    #[cfg(test)]
    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    pub fn biometric(&self) -> Option<Arc<BiometricController>> {
        self.attached.as_ref().map(|a| a.biometric.clone())
    }

    pub fn scanner(&self) -> Option<Arc<ScanController>> {
        self.attached.as_ref().map(|a| a.scanner.clone())
    }
}

impl Drop for LifecycleCoordinator {
    fn drop(&mut self) {
        self.on_detached();
    }
}
