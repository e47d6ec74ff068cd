//! Simulated platform: a prompt, a camera and a decoder that run on timers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use qr_auth_bridge::{
    Authenticators, Availability, CameraCapability, CameraProvider, Decoder, Frame, FrameImage,
    FrameSink, HostMessenger, InputImage, LensFacing, PromptCompletion, PromptDescriptor,
    ScannerError, SecurePrompt, SurfaceHandle,
};

const CODE_PREFIX: &str = "QR:";

/// Prompt that the "user" always passes after `delay`
pub(crate) struct SimPrompt {
    delay: Duration,
}

impl SimPrompt {
    pub(crate) fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl SecurePrompt for SimPrompt {
    fn availability(&self, _authenticators: Authenticators) -> Availability {
        Availability::Available
    }

    fn authenticate(
        &self,
        surface: &SurfaceHandle,
        descriptor: &PromptDescriptor,
        authenticators: Authenticators,
        completion: PromptCompletion,
    ) {
        tracing::info!(
            "Showing \"{}\" / \"{}\" on surface {} ({:?})",
            descriptor.title,
            descriptor.subtitle,
            surface.id(),
            authenticators
        );
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = completion.succeeded() {
                tracing::warn!("Simulated prompt could not report success: {}", e);
            }
        });
    }
}

#[derive(Default)]
struct FrameCounters {
    produced: AtomicU64,
    released: AtomicU64,
}

struct SimProvider {
    interval: Duration,
    counters: Arc<FrameCounters>,
    producer: Mutex<Option<JoinHandle<()>>>,
}

impl CameraProvider for SimProvider {
    fn unbind_all(&self) -> Result<(), ScannerError> {
        let producer = self
            .producer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(producer) = producer {
            producer.abort();
            tracing::debug!("Simulated camera unbound");
        }
        Ok(())
    }

    fn bind(
        &self,
        surface: &SurfaceHandle,
        lens: LensFacing,
        analyzer: FrameSink,
    ) -> Result<(), ScannerError> {
        tracing::info!("Simulated {:?} camera bound to surface {}", lens, surface.id());
        let producer = tokio::spawn(produce_frames(
            self.interval,
            self.counters.clone(),
            analyzer,
        ));
        *self.producer.lock().unwrap_or_else(PoisonError::into_inner) = Some(producer);
        Ok(())
    }
}

/// Emit a frame every `interval`. A code is in view for 20 frames out of every 100.
async fn produce_frames(interval: Duration, counters: Arc<FrameCounters>, analyzer: FrameSink) {
    let mut ticker = tokio::time::interval(interval);
    let mut sequence: u64 = 0;
    loop {
        ticker.tick().await;
        sequence += 1;

        let payload = if sequence % 100 < 20 {
            format!("{CODE_PREFIX}ticket-{}", sequence / 100)
        } else {
            String::new()
        };
        let released = counters.clone();
        let frame = Frame::new(
            FrameImage {
                data: payload.into_bytes(),
                width: 1280,
                height: 720,
            },
            90,
        )
        .on_release(move || {
            released.released.fetch_add(1, Ordering::Relaxed);
        });

        counters.produced.fetch_add(1, Ordering::Relaxed);
        if !analyzer.offer(frame) {
            tracing::debug!("Analyzer closed after {} frames", sequence);
            return;
        }
    }
}

/// Camera producing frames much faster than [`SimDecoder`] consumes them
pub(crate) struct SimCamera {
    provider: Arc<SimProvider>,
}

impl SimCamera {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            provider: Arc::new(SimProvider {
                interval,
                counters: Arc::new(FrameCounters::default()),
                producer: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn produced(&self) -> u64 {
        self.provider.counters.produced.load(Ordering::Relaxed)
    }

    pub(crate) fn released(&self) -> u64 {
        self.provider.counters.released.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CameraCapability for SimCamera {
    async fn provider(&self) -> Result<Arc<dyn CameraProvider>, ScannerError> {
        let provider: Arc<dyn CameraProvider> = self.provider.clone();
        Ok(provider)
    }
}

/// Decoder that reads `QR:`-prefixed payloads, taking `decode_time` per frame
pub(crate) struct SimDecoder {
    decode_time: Duration,
}

impl SimDecoder {
    pub(crate) fn new(decode_time: Duration) -> Self {
        Self { decode_time }
    }
}

#[async_trait]
impl Decoder for SimDecoder {
    async fn decode(&self, image: &InputImage<'_>) -> Result<Vec<String>, ScannerError> {
        tokio::time::sleep(self.decode_time).await;
        let payload =
            std::str::from_utf8(image.data).map_err(|e| ScannerError::Decode(e.to_string()))?;
        Ok(payload
            .strip_prefix(CODE_PREFIX)
            .map(|code| vec![code.to_string()])
            .unwrap_or_default())
    }
}

pub(crate) struct LoggingHost;

impl HostMessenger for LoggingHost {
    fn on_qr_code_detected(&self, value: String) {
        tracing::info!("Host received QR code: {}", value);
    }
}
