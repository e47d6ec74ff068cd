use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::errors::ScannerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanSessionState {
    Stopped,
    Starting,
    Running,
}

/// One decoded value from one analyzed frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub value: String,
}

/// Receives every detection, in analysis order, on the analysis worker
pub type DetectionCallback = Arc<dyn Fn(DetectionEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensFacing {
    #[default]
    Back,
    Front,
}

/// Clockwise rotation needed to bring a frame upright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Result<Self, ScannerError> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(ScannerError::Frame(format!(
                "unsupported rotation {other} degrees"
            ))),
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

/// Pixel data backing a camera frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// A frame borrowed from the camera's buffer pool.
///
/// The release hook runs exactly once, when the frame is dropped, which hands
/// the buffer back to the camera.
pub struct Frame {
    image: Option<FrameImage>,
    rotation_degrees: u32,
    release: Mutex<Option<ReleaseHook>>,
}

impl Frame {
    pub fn new(image: FrameImage, rotation_degrees: u32) -> Self {
        Self {
            image: Some(image),
            rotation_degrees,
            release: Mutex::new(None),
        }
    }

    /// A frame whose buffer carried no readable image
    pub fn without_image(rotation_degrees: u32) -> Self {
        Self {
            image: None,
            rotation_degrees,
            release: Mutex::new(None),
        }
    }

    pub fn on_release(self, release: impl FnOnce() + Send + 'static) -> Self {
        *self.release.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(release));
        self
    }

    pub fn image(&self) -> Option<&FrameImage> {
        self.image.as_ref()
    }

    pub fn rotation_degrees(&self) -> u32 {
        self.rotation_degrees
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("image", &self.image.as_ref().map(|i| (i.width, i.height)))
            .field("rotation_degrees", &self.rotation_degrees)
            .finish()
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        let release = self
            .release
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(release) = release {
            release();
        }
    }
}

/// Decoder input built from a frame and its rotation metadata
#[derive(Debug, Clone, Copy)]
pub struct InputImage<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
}

impl<'a> InputImage<'a> {
    /// `Ok(None)` when the frame carries no image
    pub fn from_frame(frame: &'a Frame) -> Result<Option<Self>, ScannerError> {
        let Some(image) = frame.image() else {
            return Ok(None);
        };
        let rotation = Rotation::from_degrees(frame.rotation_degrees())?;
        Ok(Some(Self {
            data: &image.data,
            width: image.width,
            height: image.height,
            rotation,
        }))
    }
}
