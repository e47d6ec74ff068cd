use std::fmt;

use tokio::sync::watch;
use uuid::Uuid;

/// Identifier of one attached foreground surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The host's foreground surface (the screen both capabilities render onto).
///
/// Exactly one owner holds a `Surface`; everything else works with the
/// non-owning [`SurfaceHandle`]. Dropping the surface marks it detached.
#[derive(Debug)]
pub struct Surface {
    id: SurfaceId,
    name: String,
    attached: watch::Sender<bool>,
}

impl Surface {
    pub fn new(name: impl Into<String>) -> Self {
        let (attached, _) = watch::channel(true);
        Self {
            id: SurfaceId::new(),
            name: name.into(),
            attached,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_attached(&self) -> bool {
        *self.attached.borrow()
    }

    /// Borrow a non-owning handle for a controller
    pub fn handle(&self) -> SurfaceHandle {
        SurfaceHandle {
            id: self.id,
            attached: self.attached.subscribe(),
        }
    }

    /// Mark the surface detached, waking everything waiting on [`SurfaceHandle::detached`]
    pub fn detach(&self) {
        if self.attached.send_replace(false) {
            tracing::debug!("Surface {} ({}) detached", self.name, self.id);
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Non-owning reference to a [`Surface`]
#[derive(Debug, Clone)]
pub struct SurfaceHandle {
    id: SurfaceId,
    attached: watch::Receiver<bool>,
}

impl SurfaceHandle {
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn is_attached(&self) -> bool {
        *self.attached.borrow()
    }

    /// Resolves once the owning surface has been detached or dropped
    pub async fn detached(&self) {
        let mut attached = self.attached.clone();
        // A closed channel means the owner is gone, which counts as detached
        let _ = attached.wait_for(|is_attached| !*is_attached).await;
    }
}
