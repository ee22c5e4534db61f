/// Fixed-capacity circular sample queue.
///
/// Used two ways in the graph: as the pending-input queue of a bus port
/// (producer pushes, the render clock drains with [`mix_into`](Self::mix_into)),
/// and as the analyser's history window (read without consuming through
/// [`copy_latest`](Self::copy_latest)).
///
/// Overflow drops the oldest samples. Wrap in `parking_lot::Mutex` for
/// cross-thread access.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<f32>,
    write_index: usize,
    available: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_index: 0,
            available: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of samples currently queued.
    pub fn len(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Append samples, dropping the oldest on overflow.
    pub fn push(&mut self, samples: &[f32]) {
        let capacity = self.capacity();
        let samples = if samples.len() > capacity {
            &samples[samples.len() - capacity..]
        } else {
            samples
        };

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % capacity;
        }
        self.available = (self.available + samples.len()).min(capacity);
    }

    fn read_index(&self) -> usize {
        (self.write_index + self.capacity() - self.available) % self.capacity()
    }

    /// Remove up to `dest.len()` of the oldest samples, adding them onto `dest`.
    ///
    /// Returns how many samples were consumed; the rest of `dest` is untouched.
    pub fn mix_into(&mut self, dest: &mut [f32]) -> usize {
        let count = dest.len().min(self.available);
        let start = self.read_index();
        let capacity = self.capacity();
        for (i, out) in dest.iter_mut().take(count).enumerate() {
            *out += self.buffer[(start + i) % capacity];
        }
        self.available -= count;
        count
    }

    /// Copy the most recent `dest.len()` samples into `dest` without consuming them.
    ///
    /// Oldest first. When fewer samples have been written, the front of
    /// `dest` is zero-filled.
    pub fn copy_latest(&self, dest: &mut [f32]) {
        let count = dest.len().min(self.available);
        let pad = dest.len() - count;
        dest[..pad].fill(0.0);

        let capacity = self.capacity();
        let start = (self.write_index + capacity - count) % capacity;
        for (i, out) in dest[pad..].iter_mut().enumerate() {
            *out = self.buffer[(start + i) % capacity];
        }
    }

    pub fn clear(&mut self) {
        self.write_index = 0;
        self.available = 0;
    }
}
