use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::graph::bus::MixBus;
use crate::models::error::TrackError;
use crate::models::recording_result::RecordingArtifact;
use crate::models::state::RecorderState;
use crate::traits::encoder::{EncoderFactory, RecordingEncoder};

/// What a toggle did.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Started { started_at: DateTime<Utc> },
    Finished(RecordingArtifact),
}

struct RecordingSession<E> {
    started_at: DateTime<Utc>,
    started: Instant,
    encoder: E,
}

/// Idle / recording switch over the shared output tap.
///
/// The state is nothing more than whether a session is present; at most one
/// exists at a time. Any encoder failure drops the session and leaves the
/// toggle idle without an artifact.
pub struct RecordingToggle<F: EncoderFactory> {
    factory: F,
    tap: MixBus,
    session: Mutex<Option<RecordingSession<F::Encoder>>>,
}

impl<F: EncoderFactory> RecordingToggle<F> {
    pub fn new(factory: F, tap: MixBus) -> Self {
        Self {
            factory,
            tap,
            session: Mutex::new(None),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn state(&self) -> RecorderState {
        match self.session.lock().as_ref() {
            Some(session) => RecorderState::Recording {
                started_at: session.started_at,
                started: session.started,
            },
            None => RecorderState::Idle,
        }
    }

    /// Start a session when idle, otherwise finalize the running one.
    ///
    /// Starting holds the session lock from the emptiness check until the new
    /// session is stored, so concurrent toggles never replace a live session.
    pub async fn toggle(&self) -> Result<ToggleOutcome, TrackError> {
        let running = {
            let mut slot = self.session.lock();
            match slot.take() {
                Some(session) => session,
                None => return self.start(&mut slot),
            }
        };
        self.finish(running).await
    }

    fn start(&self, slot: &mut Option<RecordingSession<F::Encoder>>) -> Result<ToggleOutcome, TrackError> {
        let started_at = Utc::now();
        let mut encoder = self
            .factory
            .create(&self.tap, started_at)
            .map_err(encoder_failure)?;
        encoder.start().map_err(encoder_failure)?;

        *slot = Some(RecordingSession {
            started_at,
            started: Instant::now(),
            encoder,
        });
        log::info!("Recording started at {}", started_at.to_rfc3339());
        Ok(ToggleOutcome::Started { started_at })
    }

    async fn finish(&self, session: RecordingSession<F::Encoder>) -> Result<ToggleOutcome, TrackError> {
        let elapsed = session.started.elapsed();
        let artifact = session.encoder.finish().await.map_err(encoder_failure)?;
        log::info!(
            "Recording stopped after {:.1}s: {} bytes",
            elapsed.as_secs_f64(),
            artifact.metadata.size_bytes
        );
        Ok(ToggleOutcome::Finished(artifact))
    }
}

fn encoder_failure(error: TrackError) -> TrackError {
    log::error!("Recording aborted: {}", error);
    match error {
        TrackError::EncoderFailure(_) => error,
        other => TrackError::EncoderFailure(other.to_string()),
    }
}
