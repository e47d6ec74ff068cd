mod analysis;
mod camera;
mod config;
mod controller;
mod errors;
mod types;

pub use analysis::FrameSink;
pub use camera::{CameraCapability, CameraProvider, Decoder};
pub use controller::ScanController;
pub use errors::ScannerError;
pub use types::{
    DetectionCallback, DetectionEvent, Frame, FrameImage, InputImage, LensFacing, Rotation,
    ScanSessionState,
};

pub(crate) fn init() -> Result<(), ScannerError> {
    let lens = *config::SCANNER_LENS_FACING;
    tracing::info!("Scanner lens facing: {:?}", lens);
    Ok(())
}
