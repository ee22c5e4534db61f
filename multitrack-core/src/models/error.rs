use thiserror::Error;

use super::track::TrackId;

/// Errors raised by device sessions, the audio graph, and the recorder.
///
/// The first three variants are the ways opening an input device can fail.
/// None of them is retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available: {0}")]
    DeviceUnavailable(String),

    #[error("device already in use: {0}")]
    DeviceAlreadyInUse(String),

    #[error("audio context could not be resumed: {0}")]
    ContextResumeFailed(String),

    #[error("encoder failure: {0}")]
    EncoderFailure(String),

    #[error("audio graph failure: {0}")]
    GraphFailure(String),

    #[error("track not found: {0}")]
    TrackNotFound(TrackId),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl TrackError {
    /// Whether this error came from acquiring an input device.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied | Self::DeviceUnavailable(_) | Self::DeviceAlreadyInUse(_)
        )
    }
}
