use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Runtime configuration for a [`Studio`](crate::Studio).
///
/// The processing profile itself is fixed and lives in
/// [`processing::chain`](crate::processing::chain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfiguration {
    /// Context sample rate in Hz (default: 48000).
    pub sample_rate: f64,

    /// Level meter poll period; one display frame (default: 16 ms).
    pub meter_frame_interval_ms: u64,

    /// How much audio the encoder gathers before sealing a chunk (default: 1000 ms).
    pub encoder_timeslice_ms: u64,

    /// Capacity of each input queue on a bus, in seconds (default: 2.0).
    pub tap_buffer_secs: f64,

    /// Directory finished recordings are exported to.
    pub recordings_dir: PathBuf,
}

impl StudioConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.sample_rate > 0.0) {
            return Err("sample rate must be positive".into());
        }
        if !(1..=1000).contains(&self.meter_frame_interval_ms) {
            return Err(format!(
                "meter frame interval out of range: {} ms",
                self.meter_frame_interval_ms
            ));
        }
        if self.encoder_timeslice_ms == 0 {
            return Err("encoder timeslice must be positive".into());
        }
        if !(self.tap_buffer_secs > 0.0) {
            return Err("tap buffer length must be positive".into());
        }
        Ok(())
    }

    pub fn meter_frame_interval(&self) -> Duration {
        Duration::from_millis(self.meter_frame_interval_ms)
    }

    /// Encoder chunk length in samples at the context rate.
    pub fn encoder_timeslice_samples(&self) -> usize {
        ((self.sample_rate * self.encoder_timeslice_ms as f64) / 1000.0).max(1.0) as usize
    }

    /// Per-input bus queue capacity in samples.
    pub fn tap_buffer_samples(&self) -> usize {
        (self.sample_rate * self.tap_buffer_secs).max(1.0) as usize
    }
}

impl Default for StudioConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            meter_frame_interval_ms: 16,
            encoder_timeslice_ms: 1000,
            tap_buffer_secs: 2.0,
            recordings_dir: PathBuf::from("."),
        }
    }
}
