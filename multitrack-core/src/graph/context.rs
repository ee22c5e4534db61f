use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::bus::MixBus;
use super::node::AnalyserNode;
use crate::models::error::TrackError;
use crate::processing::analyser::FFT_SIZE;
use crate::traits::context_driver::ContextDriver;

/// Lifecycle of the shared processing context.
///
/// ```text
/// Suspended → Running → Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

struct ContextShared {
    sample_rate: f64,
    queue_capacity: usize,
    state: Mutex<ContextState>,
    destination: MixBus,
    taps: Mutex<Vec<MixBus>>,
    resume_lock: tokio::sync::Mutex<()>,
}

/// Process-wide audio processing context.
///
/// Created once at startup in the suspended state. Every pipeline reads its
/// sample rate and feeds its monitoring destination; output taps created
/// here are rendered on the same clock. Cloning yields another handle.
#[derive(Clone)]
pub struct AudioContext {
    shared: Arc<ContextShared>,
}

impl AudioContext {
    pub fn new(sample_rate: f64, queue_capacity: usize) -> Self {
        Self {
            shared: Arc::new(ContextShared {
                sample_rate,
                queue_capacity,
                state: Mutex::new(ContextState::Suspended),
                destination: MixBus::new("destination", queue_capacity),
                taps: Mutex::new(Vec::new()),
                resume_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.shared.sample_rate
    }

    pub fn state(&self) -> ContextState {
        *self.shared.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.state() == ContextState::Running
    }

    /// The monitoring destination (what the user hears).
    pub fn destination(&self) -> &MixBus {
        &self.shared.destination
    }

    /// Create a bus rendered on this context's clock whose blocks go to its sinks.
    pub fn create_output_tap(&self) -> MixBus {
        let tap = MixBus::new("output-tap", self.shared.queue_capacity);
        self.shared.taps.lock().push(tap.clone());
        tap
    }

    pub fn create_analyser(&self) -> AnalyserNode {
        AnalyserNode::new(FFT_SIZE)
    }

    /// Bring the context to `Running`, starting `driver` if needed.
    ///
    /// Idempotent: concurrent callers queue on one lock and all but the first
    /// find the context already running. A closed context cannot resume.
    pub async fn resume<D: ContextDriver>(&self, driver: &D) -> Result<(), TrackError> {
        let _guard = self.shared.resume_lock.lock().await;

        match self.state() {
            ContextState::Running => return Ok(()),
            ContextState::Closed => {
                return Err(TrackError::ContextResumeFailed("context is closed".into()))
            }
            ContextState::Suspended => {}
        }

        log::info!("Resuming audio context at {} Hz", self.shared.sample_rate);
        driver.resume(self.clone()).await.map_err(|e| match e {
            TrackError::ContextResumeFailed(_) => e,
            other => TrackError::ContextResumeFailed(other.to_string()),
        })?;

        *self.shared.state.lock() = ContextState::Running;
        Ok(())
    }

    /// Stop rendering for good.
    pub fn close(&self) {
        *self.shared.state.lock() = ContextState::Closed;
    }

    /// Render one quantum of the monitoring destination into `out` and
    /// advance every output tap by the same number of samples.
    ///
    /// Writes silence and pulls nothing while the context is not running.
    pub fn render(&self, out: &mut [f32]) {
        if !self.is_running() {
            out.fill(0.0);
            return;
        }

        self.shared.destination.render_into(out);

        let taps: Vec<MixBus> = self.shared.taps.lock().clone();
        if taps.is_empty() {
            return;
        }
        let mut scratch = vec![0.0; out.len()];
        for tap in taps {
            tap.render_into(&mut scratch);
        }
    }
}

impl fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioContext")
            .field("sample_rate", &self.shared.sample_rate)
            .field("state", &self.state())
            .finish()
    }
}
