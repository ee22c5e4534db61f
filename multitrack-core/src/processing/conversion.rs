/// Streaming linear-interpolation resampler onto the context rate.
///
/// Keeps its read position and the previous block's last sample between
/// calls, so consecutive blocks join without a gap and a steady source yields
/// `target / source` output samples per input sample over time.
#[derive(Debug, Clone)]
pub struct Resampler {
    target_sample_rate: f64,
    /// Next output position in input samples, relative to the start of the
    /// next block. A value in `-1.0..0.0` lies between `last` and that block.
    position: f64,
    last: Option<f32>,
}

impl Resampler {
    pub fn new(target_sample_rate: f64) -> Self {
        Self {
            target_sample_rate,
            position: 0.0,
            last: None,
        }
    }

    pub fn target_sample_rate(&self) -> f64 {
        self.target_sample_rate
    }

    /// Forget the carried position and sample.
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.last = None;
    }

    /// Returns the input unchanged if the rates already match.
    pub fn resample(&mut self, samples: &[f32], source_sample_rate: f64) -> Vec<f32> {
        if (source_sample_rate - self.target_sample_rate).abs() < 0.01 || source_sample_rate <= 0.0 {
            self.reset();
            return samples.to_vec();
        }
        let Some(&tail) = samples.last() else {
            return Vec::new();
        };

        let step = source_sample_rate / self.target_sample_rate;
        let end = (samples.len() - 1) as f64;
        let mut output = Vec::with_capacity((samples.len() as f64 / step) as usize + 1);

        while self.position < end {
            let index = self.position.floor();
            let fraction = (self.position - index) as f32;
            let next = samples[(index + 1.0) as usize];
            let current = if index < 0.0 {
                self.last.unwrap_or(next)
            } else {
                samples[index as usize]
            };
            output.push(current + (next - current) * fraction);
            self.position += step;
        }

        self.position -= samples.len() as f64;
        self.last = Some(tail);
        output
    }
}

/// Average interleaved channels down to one.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

/// Convert f32 samples in `[-1.0, 1.0]` to 16-bit little-endian PCM bytes.
///
/// Out-of-range values are clamped.
pub fn to_pcm16_le(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        data.extend_from_slice(&value.to_le_bytes());
    }
    data
}

pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Amplitude to decibels; silence maps to a floor of -1000 dB.
pub fn linear_to_db(amplitude: f32) -> f32 {
    if amplitude <= 0.0 {
        -1000.0
    } else {
        20.0 * amplitude.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn resample_same_rate_is_passthrough() {
        let mut resampler = Resampler::new(48000.0);
        let samples = vec![1.0, 2.0, 3.0];
        assert_eq!(resampler.resample(&samples, 48000.0), samples);
    }

    #[test]
    fn resample_upsample_interpolates_across_blocks() {
        let mut resampler = Resampler::new(48000.0);

        let first = resampler.resample(&[0.0, 1.0], 24000.0);
        assert_eq!(first.len(), 2);
        assert_relative_eq!(first[0], 0.0);
        assert_relative_eq!(first[1], 0.5);

        // picks up between the previous block's last sample and this one
        let second = resampler.resample(&[2.0, 3.0], 24000.0);
        assert_eq!(second.len(), 4);
        assert_relative_eq!(second[0], 1.0);
        assert_relative_eq!(second[1], 1.5);
        assert_relative_eq!(second[2], 2.0);
        assert_relative_eq!(second[3], 2.5);
    }

    #[test]
    fn resample_downsample_halves_length() {
        let mut resampler = Resampler::new(24000.0);
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        assert_eq!(resampler.resample(&samples, 48000.0).len(), 50);
    }

    #[test]
    fn resample_keeps_fractional_output_between_blocks() {
        let mut resampler = Resampler::new(48000.0);
        let block = [0.2; 512];

        let total: usize = (0..100)
            .map(|_| resampler.resample(&block, 44100.0).len())
            .sum();

        // 51200 input samples at 44.1 kHz are 55727.9 samples at 48 kHz
        let expected = 51200.0 * 48000.0 / 44100.0;
        assert!((total as f64 - expected).abs() <= 2.0, "got {}", total);
    }

    #[test]
    fn resample_single_sample_blocks_still_advance() {
        let mut resampler = Resampler::new(48000.0);
        let total: usize = (0..1000)
            .map(|i| resampler.resample(&[i as f32], 24000.0).len())
            .sum();
        assert!((1996..=2000).contains(&total), "got {}", total);
    }

    #[test]
    fn downmix_averages_frames() {
        let mono = downmix_to_mono(&[1.0, 0.0, 0.5, 0.5, -1.0], 2);
        assert_eq!(mono, vec![0.5, 0.5]);
    }

    #[test]
    fn pcm16_clamps_and_scales() {
        let pcm = to_pcm16_le(&[0.0, 1.0, -3.0]);
        assert_eq!(pcm.len(), 6);
        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), 0);
        assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([pcm[4], pcm[5]]), -i16::MAX);
    }

    #[test]
    fn decibel_round_trip_points() {
        assert_relative_eq!(db_to_linear(0.0), 1.0);
        assert_relative_eq!(db_to_linear(-20.0), 0.1, epsilon = 1e-6);
        assert_relative_eq!(linear_to_db(0.1), -20.0, epsilon = 1e-4);
        assert_eq!(linear_to_db(0.0), -1000.0);
    }
}
