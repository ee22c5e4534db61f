use std::path::PathBuf;

use multitrack_core::storage::export::export_artifact;
use multitrack_core::{
    AttachState, RecorderState, RecordingArtifact, Studio, StudioDelegate, Track, TrackError, TrackId,
    WavEncoderFactory,
};
use multitrack_cpal::{CpalContextDriver, CpalDeviceProvider};

pub type ConsoleStudio = Studio<CpalDeviceProvider, CpalContextDriver, WavEncoderFactory>;

/// StudioDelegate that prints events and saves finished recordings.
pub struct ConsoleDelegate {
    recordings_dir: PathBuf,
}

impl ConsoleDelegate {
    pub fn new(recordings_dir: PathBuf) -> Self {
        Self { recordings_dir }
    }
}

pub fn describe_attach(state: &AttachState) -> String {
    match state {
        AttachState::Unattached => "no input".into(),
        AttachState::Attaching { device_id, .. } => format!("connecting to {}", device_id),
        AttachState::Attached { device_id, .. } => format!("live on {}", device_id),
        AttachState::TearingDown => "disconnecting".into(),
    }
}

pub fn track_label(track: &Track) -> &str {
    if track.name.is_empty() {
        "(unnamed)"
    } else {
        &track.name
    }
}

impl StudioDelegate for ConsoleDelegate {
    fn on_tracks_changed(&self, tracks: &[Track]) {
        log::debug!("{} tracks", tracks.len());
    }

    fn on_attach_state_changed(&self, track: TrackId, state: &AttachState) {
        println!("  track {}: {}", short_id(track), describe_attach(state));
    }

    fn on_recording_state_changed(&self, state: &RecorderState) {
        match state {
            RecorderState::Idle => println!("  recording stopped"),
            RecorderState::Recording { started_at, .. } => {
                println!("  recording since {}", started_at.format("%H:%M:%S"))
            }
        }
    }

    fn on_error(&self, error: &TrackError) {
        println!("  error: {}", error);
    }

    fn on_recording_finished(&self, artifact: &RecordingArtifact) {
        match export_artifact(artifact, &self.recordings_dir) {
            Ok(path) => println!(
                "  saved {} ({:.1}s, {} bytes)",
                path.display(),
                artifact.metadata.duration_secs,
                artifact.metadata.size_bytes
            ),
            Err(e) => println!("  could not save recording: {}", e),
        }
    }
}

fn short_id(id: TrackId) -> String {
    id.to_string().chars().take(8).collect()
}
