use std::future::Future;

use chrono::{DateTime, Utc};

use crate::graph::bus::MixBus;
use crate::models::error::TrackError;
use crate::models::recording_result::RecordingArtifact;

/// Consumer of rendered bus blocks.
///
/// Called from whichever thread drives the render clock.
pub trait TapSink: Send + Sync {
    fn on_block(&self, samples: &[f32]);
}

/// An encoder bound to the shared output tap for one recording session.
pub trait RecordingEncoder {
    /// Start consuming the tap.
    fn start(&mut self) -> Result<(), TrackError>;

    /// Stop consuming and finalize everything captured into one artifact.
    fn finish(self) -> impl Future<Output = Result<RecordingArtifact, TrackError>>;
}

/// Creates one encoder per recording session.
pub trait EncoderFactory {
    type Encoder: RecordingEncoder;

    fn create(&self, tap: &MixBus, started_at: DateTime<Utc>) -> Result<Self::Encoder, TrackError>;
}
