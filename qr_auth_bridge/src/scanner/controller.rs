use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::lifecycle::SurfaceHandle;

use super::analysis::AnalysisWorker;
use super::camera::{CameraCapability, CameraProvider, Decoder};
use super::config::SCANNER_LENS_FACING;
use super::errors::ScannerError;
use super::types::{DetectionCallback, LensFacing, ScanSessionState};

/// A bound camera plus its analysis worker
struct ActiveSession {
    id: Uuid,
    provider: Arc<dyn CameraProvider>,
    worker: AnalysisWorker,
}

struct ScanInner {
    state: ScanSessionState,
    // Bumped by every start and stop so a start that raced a stop can tell
    generation: u64,
    session: Option<ActiveSession>,
}

/// Owns the camera binding and the frame analysis stage for one surface
pub struct ScanController {
    camera: Arc<dyn CameraCapability>,
    decoder: Arc<dyn Decoder>,
    surface: SurfaceHandle,
    lens: LensFacing,
    on_detected: DetectionCallback,
    inner: Mutex<ScanInner>,
}

/// Reverts Starting to Stopped when a start is abandoned mid-acquisition
struct PendingStart<'a> {
    inner: &'a Mutex<ScanInner>,
    generation: u64,
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.generation == self.generation && inner.state == ScanSessionState::Starting {
            inner.state = ScanSessionState::Stopped;
        }
    }
}

impl ScanController {
    pub fn new(
        camera: Arc<dyn CameraCapability>,
        decoder: Arc<dyn Decoder>,
        surface: SurfaceHandle,
        on_detected: DetectionCallback,
    ) -> Self {
        Self::with_lens(camera, decoder, surface, *SCANNER_LENS_FACING, on_detected)
    }

    pub fn with_lens(
        camera: Arc<dyn CameraCapability>,
        decoder: Arc<dyn Decoder>,
        surface: SurfaceHandle,
        lens: LensFacing,
        on_detected: DetectionCallback,
    ) -> Self {
        Self {
            camera,
            decoder,
            surface,
            lens,
            on_detected,
            inner: Mutex::new(ScanInner {
                state: ScanSessionState::Stopped,
                generation: 0,
                session: None,
            }),
        }
    }

    pub fn state(&self) -> ScanSessionState {
        self.lock_inner().state
    }

    /// Acquire the camera and bind preview + analysis to the surface.
    ///
    /// Resolves once the scanner is Running, or with the error that sent it
    /// back to Stopped. Starting an already running scanner is a no-op.
    pub async fn start(&self) -> Result<(), ScannerError> {
        let generation = {
            let mut inner = self.lock_inner();
            match inner.state {
                ScanSessionState::Running => {
                    tracing::debug!("Scanner already running");
                    return Ok(());
                }
                ScanSessionState::Starting => {
                    return Err(ScannerError::InvalidState(
                        "scanner is already starting".to_string(),
                    ));
                }
                ScanSessionState::Stopped => {}
            }
            if !self.surface.is_attached() {
                return Err(ScannerError::SurfaceDetached);
            }
            inner.state = ScanSessionState::Starting;
            inner.generation += 1;
            inner.generation
        };
        let _pending = PendingStart {
            inner: &self.inner,
            generation,
        };

        tracing::debug!("Scanner starting on surface {}", self.surface.id());
        let provider = self.camera.provider().await;

        let mut inner = self.lock_inner();
        if inner.generation != generation {
            tracing::debug!("Scanner start aborted by stop()");
            return Err(ScannerError::StartAborted);
        }

        let provider = match provider {
            Ok(provider) => provider,
            Err(e) => {
                tracing::error!("Failed to acquire camera: {}", e);
                inner.state = ScanSessionState::Stopped;
                return Err(e);
            }
        };

        if !self.surface.is_attached() {
            inner.state = ScanSessionState::Stopped;
            return Err(ScannerError::SurfaceDetached);
        }

        let session_id = Uuid::new_v4();
        let worker = AnalysisWorker::spawn(session_id, self.decoder.clone(), self.on_detected.clone());

        // Unbind first in case a previous consumer was left bound
        let bound = provider
            .unbind_all()
            .and_then(|()| provider.bind(&self.surface, self.lens, worker.sink()));

        match bound {
            Ok(()) => {
                tracing::info!(
                    "Scan session {} running on surface {} ({:?} lens)",
                    session_id,
                    self.surface.id(),
                    self.lens
                );
                inner.state = ScanSessionState::Running;
                inner.session = Some(ActiveSession {
                    id: session_id,
                    provider,
                    worker,
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to bind camera: {}", e);
                worker.shutdown();
                inner.state = ScanSessionState::Stopped;
                Err(e)
            }
        }
    }

    /// Unbind the camera and shut the analysis worker down.
    ///
    /// Idempotent, and a no-op on a scanner that never started. Teardown
    /// failures are logged, never returned. Detections already in flight
    /// may still be delivered after this returns.
    pub fn stop(&self) {
        let session = {
            let mut inner = self.lock_inner();
            if inner.state == ScanSessionState::Stopped {
                tracing::trace!("Scanner already stopped");
                return;
            }
            inner.state = ScanSessionState::Stopped;
            inner.generation += 1;
            inner.session.take()
        };

        let Some(session) = session else {
            tracing::debug!("Scanner stopped while starting");
            return;
        };

        if let Err(e) = session.provider.unbind_all() {
            tracing::warn!("Ignoring camera unbind failure during stop: {}", e);
        }

        let stats = session.worker.stats();
        tracing::info!(
            "Scan session {} stopped: analyzed={} dropped={}",
            session.id,
            stats.analyzed(),
            stats.dropped()
        );
        session.worker.shutdown();
    }

    fn lock_inner(&self) -> MutexGuard<'_, ScanInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        self.stop();
    }
}
