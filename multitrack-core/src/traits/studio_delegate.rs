use crate::models::error::TrackError;
use crate::models::recording_result::RecordingArtifact;
use crate::models::state::{AttachState, RecorderState};
use crate::models::track::{Track, TrackId};

/// Event delegate for studio notifications.
///
/// The rendering layer re-renders from these; `on_recording_finished` is the
/// hand-off to whatever saves the artifact.
pub trait StudioDelegate: Send + Sync {
    /// The track collection changed shape or content.
    fn on_tracks_changed(&self, tracks: &[Track]);

    /// A track's pipeline attachment moved to a new state.
    fn on_attach_state_changed(&self, track: TrackId, state: &AttachState);

    fn on_recording_state_changed(&self, state: &RecorderState);

    /// A failure that was handled internally but must not be dropped silently.
    fn on_error(&self, error: &TrackError);

    fn on_recording_finished(&self, artifact: &RecordingArtifact);
}
