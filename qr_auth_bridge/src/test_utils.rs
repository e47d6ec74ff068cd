//! Test utilities shared by the unit tests across the crate
//!
//! Provides environment setup plus scriptable fakes for every platform
//! capability: the secure prompt, the camera, the barcode decoder and the
//! host push channel.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore, mpsc};

use crate::biometric::{
    Authenticators, Availability, PromptCompletion, PromptDescriptor, SecurePrompt,
};
use crate::bridge::HostMessenger;
use crate::lifecycle::SurfaceHandle;
use crate::scanner::{
    CameraCapability, CameraProvider, Decoder, DetectionCallback, DetectionEvent, Frame,
    FrameImage, FrameSink, InputImage, LensFacing, ScannerError,
};

const WAIT_LIMIT: Duration = Duration::from_secs(1);

/// Centralized test initialization for all tests across the crate
///
/// Loads `.env_test` (falling back to `.env`) exactly once.
pub fn init_test_environment() {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        if dotenvy::from_filename(".env_test").is_err() {
            dotenvy::dotenv().ok();
        }
    });
}

/// How a [`ScriptedPrompt`] answers every authentication
#[derive(Debug, Clone)]
pub enum PromptScript {
    Succeed,
    Fail(Option<String>),
    Error(String),
    /// Keep the completion for the test to resolve through [`ScriptedPrompt::wait_for_pending`]
    Hold,
    /// Drop the completion without signalling
    Abandon,
    Panic,
}

pub struct ScriptedPrompt {
    script: PromptScript,
    availability: Mutex<Availability>,
    invocations: Mutex<Vec<PromptDescriptor>>,
    pending: Mutex<Option<PromptCompletion>>,
    pending_ready: Notify,
}

impl ScriptedPrompt {
    pub fn new(script: PromptScript) -> Self {
        Self {
            script,
            availability: Mutex::new(Availability::Available),
            invocations: Mutex::new(Vec::new()),
            pending: Mutex::new(None),
            pending_ready: Notify::new(),
        }
    }

    pub fn set_availability(&self, availability: Availability) {
        *self.availability.lock().unwrap() = availability;
    }

    pub fn invocations(&self) -> Vec<PromptDescriptor> {
        self.invocations.lock().unwrap().clone()
    }

    /// Wait for a held prompt and take its completion
    pub async fn wait_for_pending(&self) -> PromptCompletion {
        tokio::time::timeout(WAIT_LIMIT, async {
            loop {
                if let Some(completion) = self.pending.lock().unwrap().take() {
                    return completion;
                }
                self.pending_ready.notified().await;
            }
        })
        .await
        .expect("prompt should be invoked")
    }
}

impl SecurePrompt for ScriptedPrompt {
    fn availability(&self, _authenticators: Authenticators) -> Availability {
        *self.availability.lock().unwrap()
    }

    fn authenticate(
        &self,
        _surface: &SurfaceHandle,
        descriptor: &PromptDescriptor,
        _authenticators: Authenticators,
        completion: PromptCompletion,
    ) {
        self.invocations.lock().unwrap().push(descriptor.clone());

        match &self.script {
            PromptScript::Succeed => {
                let _ = completion.succeeded();
            }
            PromptScript::Fail(reason) => {
                let _ = completion.failed(reason.clone());
            }
            PromptScript::Error(reason) => {
                let _ = completion.errored(reason.clone());
            }
            PromptScript::Hold => {
                *self.pending.lock().unwrap() = Some(completion);
                self.pending_ready.notify_one();
            }
            PromptScript::Abandon => drop(completion),
            PromptScript::Panic => panic!("prompt crashed"),
        }
    }
}

#[derive(Debug, Default)]
struct FakeProvider {
    reject_bind: bool,
    fail_unbind: AtomicBool,
    unbinds: AtomicUsize,
    binds: AtomicUsize,
    lens: Mutex<Option<LensFacing>>,
    sink: Mutex<Option<FrameSink>>,
}

impl CameraProvider for FakeProvider {
    fn unbind_all(&self) -> Result<(), ScannerError> {
        self.unbinds.fetch_add(1, Ordering::SeqCst);
        if self.fail_unbind.load(Ordering::SeqCst) {
            return Err(ScannerError::Binding("unbind failed".to_string()));
        }
        Ok(())
    }

    fn bind(
        &self,
        _surface: &SurfaceHandle,
        lens: LensFacing,
        analyzer: FrameSink,
    ) -> Result<(), ScannerError> {
        if self.reject_bind {
            return Err(ScannerError::Binding("use case combination rejected".to_string()));
        }
        self.binds.fetch_add(1, Ordering::SeqCst);
        *self.lens.lock().unwrap() = Some(lens);
        *self.sink.lock().unwrap() = Some(analyzer);
        Ok(())
    }
}

/// Camera whose provider records every call and lets the test push frames
pub struct FakeCamera {
    available: bool,
    gate: Option<Semaphore>,
    provider: Arc<FakeProvider>,
    provider_requests: AtomicUsize,
    requested: Notify,
}

impl FakeCamera {
    fn build(available: bool, reject_bind: bool, gated: bool) -> Self {
        Self {
            available,
            gate: gated.then(|| Semaphore::new(0)),
            provider: Arc::new(FakeProvider {
                reject_bind,
                ..FakeProvider::default()
            }),
            provider_requests: AtomicUsize::new(0),
            requested: Notify::new(),
        }
    }

    pub fn new() -> Self {
        Self::build(true, false, false)
    }

    /// A device without a usable camera
    pub fn unavailable() -> Self {
        Self::build(false, false, false)
    }

    pub fn rejecting_bind() -> Self {
        Self::build(true, true, false)
    }

    /// Provider acquisition blocks until [`FakeCamera::release_provider`]
    pub fn gated() -> Self {
        Self::build(true, false, true)
    }

    pub fn provider_requests(&self) -> usize {
        self.provider_requests.load(Ordering::SeqCst)
    }

    pub fn unbind_count(&self) -> usize {
        self.provider.unbinds.load(Ordering::SeqCst)
    }

    pub fn bind_count(&self) -> usize {
        self.provider.binds.load(Ordering::SeqCst)
    }

    pub fn bound_lens(&self) -> Option<LensFacing> {
        *self.provider.lens.lock().unwrap()
    }

    pub fn fail_unbind(&self) {
        self.provider.fail_unbind.store(true, Ordering::SeqCst);
    }

    /// Offer a frame to the most recently bound analyzer
    pub fn push_frame(&self, frame: Frame) -> bool {
        let sink = self.provider.sink.lock().unwrap().clone();
        match sink {
            Some(sink) => sink.offer(frame),
            None => false,
        }
    }

    pub async fn wait_for_provider_request(&self) {
        tokio::time::timeout(WAIT_LIMIT, async {
            while self.provider_requests() == 0 {
                self.requested.notified().await;
            }
        })
        .await
        .expect("provider should be requested");
    }

    pub fn release_provider(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }
}

#[async_trait]
impl CameraCapability for FakeCamera {
    async fn provider(&self) -> Result<Arc<dyn CameraProvider>, ScannerError> {
        self.provider_requests.fetch_add(1, Ordering::SeqCst);
        self.requested.notify_one();

        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| ScannerError::Unavailable(e.to_string()))?;
        }
        if !self.available {
            return Err(ScannerError::Unavailable("no camera on this device".to_string()));
        }
        let provider: Arc<dyn CameraProvider> = self.provider.clone();
        Ok(provider)
    }
}

/// Decoder that reads the frame bytes as comma-separated UTF-8 values.
/// The payload `ERR` fails to decode.
#[derive(Debug, Default)]
pub struct PayloadDecoder {
    gate: Option<Semaphore>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    entered: Notify,
}

impl PayloadDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every decode blocks until a permit from [`PayloadDecoder::open_gate`] is available
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn open_gate(&self, decodes: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(decodes);
        }
    }

    pub async fn wait_until_entered(&self) {
        tokio::time::timeout(WAIT_LIMIT, async {
            while self.calls() == 0 {
                self.entered.notified().await;
            }
        })
        .await
        .expect("decoder should be entered");
    }

    fn parse(data: &[u8]) -> Result<Vec<String>, ScannerError> {
        let payload =
            std::str::from_utf8(data).map_err(|e| ScannerError::Decode(e.to_string()))?;
        match payload {
            "ERR" => Err(ScannerError::Decode("unreadable code".to_string())),
            "" => Ok(Vec::new()),
            payload => Ok(payload.split(',').map(str::to_string).collect()),
        }
    }
}

#[async_trait]
impl Decoder for PayloadDecoder {
    async fn decode(&self, image: &InputImage<'_>) -> Result<Vec<String>, ScannerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(e) => {
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                    return Err(ScannerError::Decode(e.to_string()));
                }
            }
        }

        let result = Self::parse(image.data);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Counts frame releases
#[derive(Debug, Clone, Default)]
pub struct ReleaseCounter {
    released: Arc<AtomicUsize>,
}

impl ReleaseCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn track(&self, frame: Frame) -> Frame {
        let released = self.released.clone();
        frame.on_release(move || {
            released.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// An upright frame whose pixel bytes are `payload`
pub fn payload_frame(payload: &str, releases: &ReleaseCounter) -> Frame {
    let image = FrameImage {
        data: payload.as_bytes().to_vec(),
        width: 640,
        height: 480,
    };
    releases.track(Frame::new(image, 0))
}

/// A detection callback plus the receiving end of everything it was given
pub fn detection_collector() -> (DetectionCallback, mpsc::UnboundedReceiver<DetectionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: DetectionCallback = Arc::new(move |event| {
        let _ = tx.send(event);
    });
    (callback, rx)
}

/// Host that records every pushed value
#[derive(Debug, Default)]
pub struct RecordingHost {
    values: Mutex<Vec<String>>,
    pushed: Notify,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<String> {
        self.values.lock().unwrap().clone()
    }

    /// Wait until at least `count` values were pushed and return them
    pub async fn wait_for_values(&self, count: usize) -> Vec<String> {
        tokio::time::timeout(WAIT_LIMIT, async {
            loop {
                let values = self.values();
                if values.len() >= count {
                    return values;
                }
                self.pushed.notified().await;
            }
        })
        .await
        .expect("host should receive pushes")
    }
}

impl HostMessenger for RecordingHost {
    fn on_qr_code_detected(&self, value: String) {
        self.values.lock().unwrap().push(value);
        self.pushed.notify_one();
    }
}
