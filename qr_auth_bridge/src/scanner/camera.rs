use std::sync::Arc;

use async_trait::async_trait;

use crate::lifecycle::SurfaceHandle;

use super::analysis::FrameSink;
use super::errors::ScannerError;
use super::types::{InputImage, LensFacing};

/// Entry point to the platform camera stack
#[async_trait]
pub trait CameraCapability: Send + Sync + 'static {
    /// Acquire the process-wide camera provider. Fails with
    /// [`ScannerError::Unavailable`] on devices without a usable camera.
    async fn provider(&self) -> Result<Arc<dyn CameraProvider>, ScannerError>;
}

/// Binds camera use cases to a surface. Only one consumer may be bound at a time.
pub trait CameraProvider: Send + Sync + 'static {
    /// Unbind every use case. Must be idempotent.
    fn unbind_all(&self) -> Result<(), ScannerError>;

    /// Bind a preview to `surface` together with an analysis use case that
    /// delivers frames through `analyzer`.
    fn bind(
        &self,
        surface: &SurfaceHandle,
        lens: LensFacing,
        analyzer: FrameSink,
    ) -> Result<(), ScannerError>;
}

/// Barcode decoder. Returns raw values in the order the decoder reports them.
#[async_trait]
pub trait Decoder: Send + Sync + 'static {
    async fn decode(&self, image: &InputImage<'_>) -> Result<Vec<String>, ScannerError>;
}
