mod coordinator;
mod surface;

pub use coordinator::{Capabilities, LifecycleCoordinator};
pub use surface::{Surface, SurfaceHandle, SurfaceId};
