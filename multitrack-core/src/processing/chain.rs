//! The fixed per-track processing profile.
//!
//! Wiring order: source → compressor → gain → limiter → analyser.
//! The constants are a single broadcast-safe profile and are not exposed
//! through configuration.

use super::dynamics::{Compressor, CompressorParams};

pub const TRACK_GAIN: f32 = 1.0;

pub const COMPRESSOR: CompressorParams = CompressorParams {
    threshold_db: -14.0,
    knee_db: 0.9,
    ratio: 4.0,
    attack_secs: 0.035,
    release_secs: 0.050,
};

// Only threshold and ratio are part of the profile; knee, attack and
// release are the platform defaults for a compressor node.
pub const LIMITER: CompressorParams = CompressorParams {
    threshold_db: 0.0,
    knee_db: 30.0,
    ratio: 100.0,
    attack_secs: 0.003,
    release_secs: 0.25,
};

/// Compressor, gain and limiter stages for one track.
#[derive(Debug, Clone)]
pub struct ProcessingChain {
    compressor: Compressor,
    gain: f32,
    limiter: Compressor,
}

impl ProcessingChain {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            compressor: Compressor::new(COMPRESSOR, sample_rate),
            gain: TRACK_GAIN,
            limiter: Compressor::new(LIMITER, sample_rate),
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    pub fn limiter(&self) -> &Compressor {
        &self.limiter
    }

    /// Run one mono block through compressor → gain → limiter in place.
    pub fn process(&mut self, block: &mut [f32]) {
        self.compressor.process(block);
        if self.gain != 1.0 {
            for sample in block.iter_mut() {
                *sample *= self.gain;
            }
        }
        self.limiter.process(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_constants() {
        let chain = ProcessingChain::new(48000.0);
        assert_eq!(chain.gain(), 1.0);
        assert_eq!(chain.compressor().params(), &COMPRESSOR);
        assert_eq!(chain.limiter().params().threshold_db, 0.0);
        assert_eq!(chain.limiter().params().ratio, 100.0);
    }

    #[test]
    fn silence_stays_silent() {
        let mut chain = ProcessingChain::new(48000.0);
        let mut block = [0.0; 64];
        chain.process(&mut block);
        assert!(block.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn sustained_hot_signal_is_tamed() {
        let mut chain = ProcessingChain::new(48000.0);
        // one second of a full-scale square wave
        let mut block: Vec<f32> = (0..48000).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        chain.process(&mut block);

        let tail_peak = block[40000..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(tail_peak < 0.5, "tail peak {}", tail_peak);
    }
}
