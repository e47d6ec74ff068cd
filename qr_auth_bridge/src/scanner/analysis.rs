use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::camera::Decoder;
use super::types::{DetectionCallback, DetectionEvent, Frame, InputImage};

#[derive(Debug, Default)]
pub(crate) struct AnalysisStats {
    analyzed: AtomicU64,
    dropped: AtomicU64,
}

impl AnalysisStats {
    pub(crate) fn analyzed(&self) -> u64 {
        self.analyzed.load(Ordering::Relaxed)
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
struct SlotState {
    pending: Option<Frame>,
    closed: bool,
}

/// Holds at most one frame waiting for analysis
#[derive(Debug, Default)]
struct LatestFrameSlot {
    state: Mutex<SlotState>,
    ready: Notify,
    stats: AnalysisStats,
}

impl LatestFrameSlot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn next_frame(&self) -> Option<Frame> {
        loop {
            {
                let mut state = self.lock();
                if let Some(frame) = state.pending.take() {
                    return Some(frame);
                }
                if state.closed {
                    return None;
                }
            }
            self.ready.notified().await;
        }
    }

    fn close(&self) {
        let pending = {
            let mut state = self.lock();
            state.closed = true;
            state.pending.take()
        };
        // Released outside the lock
        drop(pending);
        self.ready.notify_one();
    }
}

/// Camera-facing end of the analysis stage.
///
/// Keeps only the latest frame: offering a frame while another is still
/// waiting drops (and releases) the waiting one. Never blocks.
#[derive(Debug, Clone)]
pub struct FrameSink {
    slot: Arc<LatestFrameSlot>,
}

impl FrameSink {
    /// Returns `false` when the analysis stage has shut down; the frame is released
    pub fn offer(&self, frame: Frame) -> bool {
        let stale = {
            let mut state = self.slot.lock();
            if state.closed {
                None
            } else {
                Some(state.pending.replace(frame))
            }
        };

        match stale {
            None => {
                tracing::trace!("Analysis stage closed, releasing frame");
                false
            }
            Some(stale) => {
                if stale.is_some() {
                    self.slot.stats.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!("Dropping stale frame in favour of the latest one");
                }
                drop(stale);
                self.slot.ready.notify_one();
                true
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.slot.lock().closed
    }
}

/// Single background worker that decodes frames one at a time
#[derive(Debug)]
pub(crate) struct AnalysisWorker {
    sink: FrameSink,
    task: JoinHandle<()>,
}

impl AnalysisWorker {
    pub(crate) fn spawn(
        session_id: Uuid,
        decoder: Arc<dyn Decoder>,
        on_detected: DetectionCallback,
    ) -> Self {
        let slot = Arc::new(LatestFrameSlot::default());
        let task = tokio::spawn(run(session_id, slot.clone(), decoder, on_detected));
        Self {
            sink: FrameSink { slot },
            task,
        }
    }

    pub(crate) fn sink(&self) -> FrameSink {
        self.sink.clone()
    }

    pub(crate) fn stats(&self) -> &AnalysisStats {
        &self.sink.slot.stats
    }

    /// Close the frame slot. The worker finishes the frame it is decoding, if any, then exits.
    pub(crate) fn shutdown(self) -> JoinHandle<()> {
        self.sink.slot.close();
        self.task
    }
}

async fn run(
    session_id: Uuid,
    slot: Arc<LatestFrameSlot>,
    decoder: Arc<dyn Decoder>,
    on_detected: DetectionCallback,
) {
    tracing::debug!("Analysis worker for scan session {} started", session_id);

    while let Some(frame) = slot.next_frame().await {
        let forwarded = analyze_frame(frame, decoder.as_ref(), &on_detected).await;
        slot.stats.analyzed.fetch_add(1, Ordering::Relaxed);
        if forwarded > 0 {
            tracing::debug!(
                "Scan session {} forwarded {} detection(s)",
                session_id,
                forwarded
            );
        }
    }

    tracing::debug!("Analysis worker for scan session {} exited", session_id);
}

/// Decode one frame, forward every non-empty value, then release the frame
async fn analyze_frame(
    frame: Frame,
    decoder: &dyn Decoder,
    on_detected: &DetectionCallback,
) -> usize {
    let image = InputImage::from_frame(&frame);
    let forwarded = match image {
        Ok(Some(image)) => match decoder.decode(&image).await {
            Ok(values) => {
                let mut forwarded = 0;
                for value in values.into_iter().filter(|v| !v.is_empty()) {
                    on_detected(DetectionEvent { value });
                    forwarded += 1;
                }
                forwarded
            }
            Err(e) => {
                tracing::debug!("Skipping frame after decode error: {}", e);
                0
            }
        },
        Ok(None) => {
            tracing::trace!("Frame carried no image");
            0
        }
        Err(e) => {
            tracing::warn!("Skipping unreadable frame: {}", e);
            0
        }
    };
    drop(frame);
    forwarded
}
