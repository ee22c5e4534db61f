use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::graph::bus::{MixBus, SinkId};
use crate::models::config::StudioConfiguration;
use crate::models::error::TrackError;
use crate::models::recording_result::{RecordingArtifact, RecordingMetadata};
use crate::processing::conversion::to_pcm16_le;
use crate::processing::wav_format::{WavSpec, WAV_HEADER_SIZE};
use crate::traits::encoder::{EncoderFactory, RecordingEncoder, TapSink};

/// Creates [`WavEncoder`]s for the shared output tap.
#[derive(Debug, Clone, Copy)]
pub struct WavEncoderFactory {
    sample_rate: u32,
    timeslice_samples: usize,
}

impl WavEncoderFactory {
    pub fn new(sample_rate: u32, timeslice_samples: usize) -> Self {
        Self {
            sample_rate,
            timeslice_samples: timeslice_samples.max(1),
        }
    }

    /// Mono 16-bit at the context rate, chunked every configured timeslice.
    pub fn from_config(config: &StudioConfiguration) -> Self {
        Self::new(config.sample_rate.round() as u32, config.encoder_timeslice_samples())
    }
}

impl EncoderFactory for WavEncoderFactory {
    type Encoder = WavEncoder;

    fn create(&self, tap: &MixBus, started_at: DateTime<Utc>) -> Result<WavEncoder, TrackError> {
        Ok(WavEncoder::new(
            tap.clone(),
            WavSpec::pcm16_mono(self.sample_rate),
            self.timeslice_samples,
            started_at,
        ))
    }
}

struct ChunkState {
    pending: Vec<f32>,
    chunks: Vec<Vec<u8>>,
    timeslice: usize,
    closed: bool,
}

impl ChunkState {
    fn seal(&mut self, count: usize) {
        let sealed: Vec<f32> = self.pending.drain(..count).collect();
        self.chunks.push(to_pcm16_le(&sealed));
    }
}

struct ChunkSink {
    state: Mutex<ChunkState>,
}

impl TapSink for ChunkSink {
    fn on_block(&self, samples: &[f32]) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.pending.extend_from_slice(samples);
        while state.pending.len() >= state.timeslice {
            let timeslice = state.timeslice;
            state.seal(timeslice);
        }
    }
}

/// Chunked 16-bit PCM encoder reading the shared output tap.
///
/// While running, every `timeslice` samples of tap output are sealed into a
/// PCM chunk. `finish` seals the remainder and joins header and chunks into
/// one WAV blob:
///
/// ```text
/// [44-byte WAV header] [chunk 1] [chunk 2] ... [final partial chunk]
/// ```
pub struct WavEncoder {
    tap: MixBus,
    spec: WavSpec,
    sink: Arc<ChunkSink>,
    sink_id: Option<SinkId>,
    started_at: DateTime<Utc>,
}

impl WavEncoder {
    pub fn new(tap: MixBus, spec: WavSpec, timeslice_samples: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            tap,
            spec,
            sink: Arc::new(ChunkSink {
                state: Mutex::new(ChunkState {
                    pending: Vec::new(),
                    chunks: Vec::new(),
                    timeslice: timeslice_samples.max(1),
                    closed: false,
                }),
            }),
            sink_id: None,
            started_at,
        }
    }

    pub fn is_running(&self) -> bool {
        self.sink_id.is_some()
    }

    /// Chunks sealed so far.
    pub fn chunk_count(&self) -> usize {
        self.sink.state.lock().chunks.len()
    }

    fn detach(&mut self) -> bool {
        match self.sink_id.take() {
            Some(id) => self.tap.remove_sink(id),
            None => false,
        }
    }
}

impl RecordingEncoder for WavEncoder {
    fn start(&mut self) -> Result<(), TrackError> {
        if self.sink_id.is_some() {
            return Err(TrackError::EncoderFailure("encoder already started".into()));
        }
        self.sink_id = Some(self.tap.add_sink(self.sink.clone()));
        log::info!("WAV encoder started on {}", self.tap.label());
        Ok(())
    }

    async fn finish(mut self) -> Result<RecordingArtifact, TrackError> {
        if !self.detach() {
            return Err(TrackError::EncoderFailure("encoder was never started".into()));
        }

        let chunks = {
            let mut state = self.sink.state.lock();
            state.closed = true;
            let remaining = state.pending.len();
            if remaining > 0 {
                state.seal(remaining);
            }
            std::mem::take(&mut state.chunks)
        };

        let data_size: usize = chunks.iter().map(Vec::len).sum();
        let data_size_u32 = u32::try_from(data_size)
            .map_err(|_| TrackError::EncoderFailure("recording exceeds WAV size limit".into()))?;

        let mut bytes = Vec::with_capacity(WAV_HEADER_SIZE + data_size);
        bytes.extend_from_slice(&self.spec.header(data_size_u32));
        for chunk in &chunks {
            bytes.extend_from_slice(chunk);
        }

        let checksum = hex_encode(&Sha256::digest(&bytes));
        let metadata = RecordingMetadata {
            id: uuid::Uuid::new_v4().to_string(),
            mime_type: "audio/wav".into(),
            started_at: self.started_at,
            created_at: Utc::now(),
            duration_secs: self.spec.duration_secs(data_size),
            sample_rate: self.spec.sample_rate,
            channels: self.spec.channels,
            chunk_count: chunks.len(),
            size_bytes: bytes.len() as u64,
            checksum,
        };

        log::info!(
            "WAV encoder finished: {} bytes in {} chunks ({:.2}s)",
            metadata.size_bytes,
            metadata.chunk_count,
            metadata.duration_secs
        );
        Ok(RecordingArtifact { bytes, metadata })
    }
}

impl Drop for WavEncoder {
    fn drop(&mut self) {
        self.detach();
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
