//! Scriptable doubles for the backend traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::graph::bus::MixBus;
use crate::graph::context::AudioContext;
use crate::models::error::TrackError;
use crate::models::recording_result::RecordingArtifact;
use crate::storage::wav_encoder::{WavEncoder, WavEncoderFactory};
use crate::traits::context_driver::ContextDriver;
use crate::traits::device_provider::{AudioBufferCallback, DeviceProvider, InputStream};
use crate::traits::encoder::{EncoderFactory, RecordingEncoder};

pub async fn running_context() -> AudioContext {
    let context = AudioContext::new(48000.0, 48000);
    context
        .resume(&ManualDriver::default())
        .await
        .expect("manual driver always resumes");
    context
}

// --- Device provider ---

#[derive(Default)]
struct StreamShared {
    callback: Mutex<Option<AudioBufferCallback>>,
    stopped: AtomicBool,
    fail_start: AtomicBool,
}

/// Test-side handle to a stream the provider handed out.
#[derive(Clone)]
pub struct FakeStreamHandle {
    device_id: String,
    shared: Arc<StreamShared>,
}

impl FakeStreamHandle {
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    pub fn is_started(&self) -> bool {
        self.shared.callback.lock().is_some()
    }

    pub fn fail_start(&self) {
        self.shared.fail_start.store(true, Ordering::SeqCst);
    }

    /// Deliver mono 48 kHz samples as the backend would.
    pub fn feed(&self, samples: &[f32]) {
        self.feed_with(samples, 48000.0, 1);
    }

    pub fn feed_with(&self, samples: &[f32], rate: f64, channels: u16) {
        let callback = self.shared.callback.lock().clone();
        if let Some(callback) = callback {
            callback(samples, rate, channels);
        }
    }
}

pub struct FakeStream {
    handle: FakeStreamHandle,
}

impl InputStream for FakeStream {
    fn device_id(&self) -> &str {
        &self.handle.device_id
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), TrackError> {
        if self.handle.shared.fail_start.load(Ordering::SeqCst) {
            return Err(TrackError::Backend("stream refused to start".into()));
        }
        *self.handle.shared.callback.lock() = Some(callback);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TrackError> {
        self.handle.shared.callback.lock().take();
        self.handle.shared.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct ProviderShared {
    failures: Mutex<HashMap<String, TrackError>>,
    failing_starts: Mutex<Vec<String>>,
    gated: AtomicBool,
    pending: Mutex<Vec<(String, oneshot::Sender<()>)>>,
    opened: Mutex<Vec<FakeStreamHandle>>,
}

/// Device provider whose outcomes and completion order the test controls.
///
/// In gated mode every `open` parks until [`release`](Self::release) is
/// called for its device, so tests can resolve opens out of order.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    shared: Arc<ProviderShared>,
}

impl ScriptedProvider {
    pub fn gated() -> Self {
        let provider = Self::default();
        provider.shared.gated.store(true, Ordering::SeqCst);
        provider
    }

    pub fn fail(&self, device_id: &str, error: TrackError) {
        self.shared.failures.lock().insert(device_id.to_string(), error);
    }

    pub fn fail_start(&self, device_id: &str) {
        self.shared.failing_starts.lock().push(device_id.to_string());
    }

    /// Let the oldest pending open for `device_id` settle.
    pub fn release(&self, device_id: &str) -> bool {
        let mut pending = self.shared.pending.lock();
        let Some(index) = pending.iter().position(|(id, _)| id == device_id) else {
            return false;
        };
        let (_, sender) = pending.remove(index);
        sender.send(()).is_ok()
    }

    pub fn pending(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Most recent stream opened on `device_id`.
    pub fn stream(&self, device_id: &str) -> Option<FakeStreamHandle> {
        self.shared
            .opened
            .lock()
            .iter()
            .rev()
            .find(|handle| handle.device_id == device_id)
            .cloned()
    }

    pub fn opened(&self) -> Vec<FakeStreamHandle> {
        self.shared.opened.lock().clone()
    }
}

impl DeviceProvider for ScriptedProvider {
    type Stream = FakeStream;

    async fn open(&self, device_id: &str) -> Result<FakeStream, TrackError> {
        if self.shared.gated.load(Ordering::SeqCst) {
            let (sender, receiver) = oneshot::channel();
            self.shared.pending.lock().push((device_id.to_string(), sender));
            let _ = receiver.await;
        }

        if let Some(error) = self.shared.failures.lock().get(device_id) {
            return Err(error.clone());
        }

        let handle = FakeStreamHandle {
            device_id: device_id.to_string(),
            shared: Arc::new(StreamShared::default()),
        };
        if self.shared.failing_starts.lock().iter().any(|id| id == device_id) {
            handle.fail_start();
        }
        self.shared.opened.lock().push(handle.clone());
        Ok(FakeStream { handle })
    }
}

// --- Context drivers ---

/// Resumes immediately; the test drives `render` by hand.
#[derive(Default)]
pub struct ManualDriver {
    resumes: AtomicUsize,
}

impl ManualDriver {
    pub fn resume_count(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }
}

impl ContextDriver for ManualDriver {
    async fn resume(&self, _context: AudioContext) -> Result<(), TrackError> {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails to resume until told otherwise.
#[derive(Default)]
pub struct FailingDriver;

impl ContextDriver for FailingDriver {
    async fn resume(&self, _context: AudioContext) -> Result<(), TrackError> {
        Err(TrackError::ContextResumeFailed("autoplay blocked".into()))
    }
}

/// Driver that blocks resumes while `blocked` is set.
#[derive(Default)]
pub struct ToggleDriver {
    pub blocked: AtomicBool,
}

impl ContextDriver for ToggleDriver {
    async fn resume(&self, _context: AudioContext) -> Result<(), TrackError> {
        if self.blocked.load(Ordering::SeqCst) {
            return Err(TrackError::ContextResumeFailed("autoplay blocked".into()));
        }
        Ok(())
    }
}

// --- Encoders ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Create,
    Start,
    Finish,
}

/// Wraps the WAV encoder and can fail at a chosen step.
#[derive(Default)]
pub struct FlakyEncoderFactory {
    pub fail_at: Mutex<Option<FailAt>>,
}

impl FlakyEncoderFactory {
    pub fn fail_at(&self, step: Option<FailAt>) {
        *self.fail_at.lock() = step;
    }
}

pub struct FlakyEncoder {
    inner: WavEncoder,
    fail_at: Option<FailAt>,
}

impl EncoderFactory for FlakyEncoderFactory {
    type Encoder = FlakyEncoder;

    fn create(&self, tap: &MixBus, started_at: DateTime<Utc>) -> Result<FlakyEncoder, TrackError> {
        let fail_at = *self.fail_at.lock();
        if fail_at == Some(FailAt::Create) {
            return Err(TrackError::EncoderFailure("no encoder available".into()));
        }
        let inner = WavEncoderFactory::new(48000, 4800).create(tap, started_at)?;
        Ok(FlakyEncoder { inner, fail_at })
    }
}

impl RecordingEncoder for FlakyEncoder {
    fn start(&mut self) -> Result<(), TrackError> {
        if self.fail_at == Some(FailAt::Start) {
            return Err(TrackError::EncoderFailure("encoder refused to start".into()));
        }
        self.inner.start()
    }

    async fn finish(self) -> Result<RecordingArtifact, TrackError> {
        if self.fail_at == Some(FailAt::Finish) {
            return Err(TrackError::EncoderFailure("finalize failed".into()));
        }
        self.inner.finish().await
    }
}
