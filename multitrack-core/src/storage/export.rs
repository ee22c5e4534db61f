use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::TrackError;
use crate::models::recording_result::{RecordingArtifact, RecordingMetadata};

/// Save `artifact` into `dir` with a JSON metadata sidecar.
///
/// Writes `{dir}/{file_name}` and `{dir}/{file_name stem}.metadata.json`,
/// creating `dir` if needed. Returns the path of the recording.
pub fn export_artifact(artifact: &RecordingArtifact, dir: &Path) -> Result<PathBuf, TrackError> {
    fs::create_dir_all(dir)
        .map_err(|e| TrackError::StorageError(format!("failed to create directory: {}", e)))?;

    let path = dir.join(artifact.file_name());
    fs::write(&path, &artifact.bytes)
        .map_err(|e| TrackError::StorageError(format!("failed to write recording: {}", e)))?;
    write_metadata(&artifact.metadata, &path)?;

    log::info!("Recording exported to {}", path.display());
    Ok(path)
}

fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), TrackError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| TrackError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(recording_path), json)
        .map_err(|e| TrackError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, TrackError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| TrackError::StorageError(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| TrackError::StorageError(format!("failed to parse metadata: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn artifact() -> RecordingArtifact {
        RecordingArtifact {
            bytes: vec![1, 2, 3, 4],
            metadata: RecordingMetadata {
                id: "rec-1".into(),
                mime_type: "audio/wav".into(),
                started_at: Utc::now(),
                created_at: Utc::now(),
                duration_secs: 0.5,
                sample_rate: 48000,
                channels: 1,
                chunk_count: 1,
                size_bytes: 4,
                checksum: "abc".into(),
            },
        }
    }

    #[test]
    fn export_writes_blob_and_sidecar() {
        let dir = std::env::temp_dir().join(format!("multitrack_export_{}", uuid::Uuid::new_v4()));
        let artifact = artifact();

        let path = export_artifact(&artifact, &dir).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("wav"));
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(read_metadata(&path).unwrap(), artifact.metadata);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_sidecar_is_storage_error() {
        let path = std::env::temp_dir().join("multitrack_missing_recording.wav");
        assert!(matches!(read_metadata(&path), Err(TrackError::StorageError(_))));
    }
}
