//! Feed-forward dynamics compressor.
//!
//! Used twice in every track chain: once as the main compressor and once,
//! with a 100:1 ratio at 0 dB, as the limiter.
//!
//! # Algorithm
//!
//! 1. The input level in dB is mapped through a static curve with a
//!    quadratic soft knee of width `knee_db` centred on the threshold.
//! 2. The difference between curve and input is the target gain reduction.
//! 3. A one-pole envelope follows the target: the attack coefficient applies
//!    while reduction is increasing, the release coefficient while it decays.
//! 4. The input sample is scaled by the smoothed reduction. There is no
//!    makeup gain.

use super::conversion::{db_to_linear, linear_to_db};

/// Static compressor parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorParams {
    pub threshold_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
    pub attack_secs: f32,
    pub release_secs: f32,
}

/// Per-sample dynamics compressor with smoothed gain reduction.
#[derive(Debug, Clone)]
pub struct Compressor {
    params: CompressorParams,
    attack_coeff: f32,
    release_coeff: f32,
    /// Current smoothed gain reduction in dB (always ≤ 0)
    reduction_db: f32,
}

impl Compressor {
    pub fn new(params: CompressorParams, sample_rate: f64) -> Self {
        Self {
            params,
            attack_coeff: time_coefficient(params.attack_secs, sample_rate),
            release_coeff: time_coefficient(params.release_secs, sample_rate),
            reduction_db: 0.0,
        }
    }

    pub fn params(&self) -> &CompressorParams {
        &self.params
    }

    /// Current smoothed gain reduction in dB (0 when idle, negative when compressing).
    pub fn reduction_db(&self) -> f32 {
        self.reduction_db
    }

    /// Output level in dB for a given input level, before smoothing.
    pub fn static_curve_db(&self, input_db: f32) -> f32 {
        let CompressorParams {
            threshold_db,
            knee_db,
            ratio,
            ..
        } = self.params;
        let over = input_db - threshold_db;

        if 2.0 * over < -knee_db {
            input_db
        } else if knee_db > 0.0 && 2.0 * over.abs() <= knee_db {
            let x = over + knee_db / 2.0;
            input_db + (1.0 / ratio - 1.0) * x * x / (2.0 * knee_db)
        } else {
            threshold_db + over / ratio
        }
    }

    pub fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let input_db = linear_to_db(sample.abs());
            let target = (self.static_curve_db(input_db) - input_db).min(0.0);

            let coeff = if target < self.reduction_db {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.reduction_db = self.reduction_db * coeff + target * (1.0 - coeff);

            *sample *= db_to_linear(self.reduction_db);
        }
    }

    pub fn reset(&mut self) {
        self.reduction_db = 0.0;
    }
}

/// One-pole coefficient for time-constant `secs`: `exp(-1 / (τ × fs))`.
fn time_coefficient(secs: f32, sample_rate: f64) -> f32 {
    if secs <= 0.0 {
        return 0.0;
    }
    (-1.0 / (secs as f64 * sample_rate)).exp() as f32
}
