//! # multitrack-core
//!
//! Platform-agnostic core of a multitrack audio recorder.
//!
//! Each track opens one input device and runs it through a fixed
//! broadcast-safe chain into a shared output tap; the tap feeds both the
//! monitoring output and the recording encoder. Platform backends implement
//! the `DeviceProvider` and `ContextDriver` traits and plug into the generic
//! `Studio`.
//!
//! ## Architecture
//!
//! ```text
//! multitrack-core (this crate)
//! ├── traits/       ← DeviceProvider, InputStream, ContextDriver, EncoderFactory, StudioDelegate
//! ├── models/       ← TrackError, Track, AttachState, RecorderState, StudioConfiguration
//! ├── processing/   ← Compressor, ProcessingChain, Analyser, Resampler, RingBuffer, WAV header
//! ├── graph/        ← AudioContext, MixBus (output tap / destination), SourceNode, AnalyserNode
//! ├── session/      ← DeviceSession, pipeline, TrackLifecycleManager, RecordingToggle, Studio
//! ├── display/      ← interval formatter, LevelMeter
//! └── storage/      ← WavEncoder, artifact export
//! ```

pub mod display;
pub mod graph;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use display::interval::format_interval;
pub use display::meter::LevelMeter;
pub use graph::bus::MixBus;
pub use graph::context::{AudioContext, ContextState};
pub use graph::node::AnalyserNode;
pub use models::audio_models::{AudioDevice, GraphDiagnostics};
pub use models::config::StudioConfiguration;
pub use models::error::TrackError;
pub use models::recording_result::{RecordingArtifact, RecordingMetadata};
pub use models::state::{AttachState, RecorderState};
pub use models::track::{Track, TrackId, TrackPatch, DEFAULT_DEVICE_ID};
pub use session::lifecycle::{AttachOutcome, TrackLifecycleManager};
pub use session::recorder::{RecordingToggle, ToggleOutcome};
pub use session::studio::Studio;
pub use storage::export::export_artifact;
pub use storage::wav_encoder::{WavEncoder, WavEncoderFactory};
pub use traits::context_driver::ContextDriver;
pub use traits::device_provider::{AudioBufferCallback, DeviceProvider, InputStream};
pub use traits::encoder::{EncoderFactory, RecordingEncoder, TapSink};
pub use traits::studio_delegate::StudioDelegate;
