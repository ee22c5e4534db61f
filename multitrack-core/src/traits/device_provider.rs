use std::future::Future;
use std::sync::Arc;

use crate::models::error::TrackError;

/// Callback invoked when an input buffer is available.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples.
/// - `sample_rate`: The actual sample rate of the delivered audio.
/// - `channels`: Number of interleaved channels.
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], f64, u16) + Send + Sync + 'static>;

/// A live stream from one opened input device.
///
/// Exclusively owned by the pipeline built on top of it.
pub trait InputStream: Send + 'static {
    /// Identifier of the device this stream was opened on.
    fn device_id(&self) -> &str;

    /// Begin delivering buffers to `callback`.
    ///
    /// The callback may fire on a backend audio thread; keep processing minimal.
    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), TrackError>;

    /// Stop delivering buffers and release the hardware. Must be idempotent.
    fn stop(&mut self) -> Result<(), TrackError>;
}

/// Source of device sessions.
///
/// `open` requests exclusive access to one audio input (no video) and settles
/// once the platform grants or refuses it. Failures are reported as
/// [`TrackError::PermissionDenied`], [`TrackError::DeviceUnavailable`] or
/// [`TrackError::DeviceAlreadyInUse`]; callers must not expect a retry to
/// succeed without user intervention.
pub trait DeviceProvider {
    type Stream: InputStream;

    fn open(&self, device_id: &str) -> impl Future<Output = Result<Self::Stream, TrackError>>;
}
