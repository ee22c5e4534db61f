use super::ring_buffer::RingBuffer;

/// Time-domain analysis window size, in samples.
pub const FFT_SIZE: usize = 1024;

/// Keeps the most recent `fft_size` processed samples for metering.
#[derive(Debug)]
pub struct Analyser {
    history: RingBuffer,
}

impl Analyser {
    pub fn new(fft_size: usize) -> Self {
        Self {
            history: RingBuffer::new(fft_size),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.history.capacity()
    }

    pub fn ingest(&mut self, block: &[f32]) {
        self.history.push(block);
    }

    /// Copy the latest window into `dest`, oldest first, zero-padded at the front.
    pub fn time_domain_data(&self, dest: &mut [f32]) {
        self.history.copy_latest(dest);
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new(FFT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_tracks_latest_samples() {
        let mut analyser = Analyser::new(4);
        analyser.ingest(&[0.1, 0.2, 0.3]);
        analyser.ingest(&[0.4, 0.5]);

        let mut window = [0.0; 4];
        analyser.time_domain_data(&mut window);
        assert_eq!(window, [0.2, 0.3, 0.4, 0.5]);
    }

    #[test]
    fn default_window_is_1024() {
        assert_eq!(Analyser::default().fft_size(), 1024);
    }
}
