use std::fmt;
use std::time::Instant;

use crate::models::error::TrackError;
use crate::traits::device_provider::{DeviceProvider, InputStream};

/// An opened audio input, held until a pipeline takes it over.
///
/// Replaced wholesale when the track's device selection changes; never
/// mutated in place.
pub struct DeviceSession {
    device_id: String,
    stream: Box<dyn InputStream>,
    opened_at: Instant,
}

impl DeviceSession {
    /// Request access to `device_id` and wait for the platform to settle it.
    pub async fn open<P: DeviceProvider>(provider: &P, device_id: &str) -> Result<Self, TrackError> {
        log::debug!("Opening input device {}", device_id);
        let stream = provider.open(device_id).await.map_err(|e| {
            log::warn!("Input device {} could not be opened: {}", device_id, e);
            e
        })?;
        Ok(Self {
            device_id: device_id.to_string(),
            stream: Box::new(stream),
            opened_at: Instant::now(),
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    /// Release the device without building anything on it.
    pub fn close(mut self) {
        if let Err(e) = self.stream.stop() {
            log::warn!("Failed to release input device {}: {}", self.device_id, e);
        }
    }

    pub(crate) fn into_stream(self) -> Box<dyn InputStream> {
        self.stream
    }
}

impl fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("device_id", &self.device_id)
            .field("opened_at", &self.opened_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedProvider;

    #[tokio::test]
    async fn open_reports_device_errors() {
        let provider = ScriptedProvider::default();
        provider.fail("mic-1", TrackError::DeviceUnavailable("unplugged".into()));

        let err = DeviceSession::open(&provider, "mic-1").await.unwrap_err();
        assert_eq!(err, TrackError::DeviceUnavailable("unplugged".into()));
        assert!(err.is_device_error());
    }

    #[tokio::test]
    async fn close_releases_stream() {
        let provider = ScriptedProvider::default();
        let session = DeviceSession::open(&provider, "mic-2").await.unwrap();
        assert_eq!(session.device_id(), "mic-2");

        session.close();
        assert!(provider.stream("mic-2").unwrap().is_stopped());
    }
}
