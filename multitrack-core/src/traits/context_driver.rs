use std::future::Future;

use crate::graph::context::AudioContext;
use crate::models::error::TrackError;

/// Drives an [`AudioContext`]'s render clock on real output hardware.
///
/// `resume` starts (or restarts) calling [`AudioContext::render`] once per
/// output quantum and settles when the clock is live. It is only called
/// while the context is suspended, but implementations should still treat a
/// second call as a no-op.
pub trait ContextDriver {
    fn resume(&self, context: AudioContext) -> impl Future<Output = Result<(), TrackError>>;

    /// Stop the render clock. Safe to call when not running.
    fn suspend(&self) -> Result<(), TrackError> {
        Ok(())
    }
}
