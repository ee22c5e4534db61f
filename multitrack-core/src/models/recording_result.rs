use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single deliverable produced when a recording session is finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingArtifact {
    pub bytes: Vec<u8>,
    pub metadata: RecordingMetadata,
}

impl RecordingArtifact {
    /// Suggested file name, e.g. `recording_2026-10-16T10-31-07.wav`.
    pub fn file_name(&self) -> String {
        let stamp = self.metadata.started_at.format("%Y-%m-%dT%H-%M-%S");
        format!("recording_{}.{}", stamp, self.metadata.extension())
    }
}

/// Metadata describing a finalized recording.
///
/// Serializable for the JSON sidecar written on export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub mime_type: String,
    pub started_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub chunk_count: usize,
    pub size_bytes: u64,
    pub checksum: String,
}

impl RecordingMetadata {
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "audio/wav" => "wav",
            _ => "bin",
        }
    }
}
