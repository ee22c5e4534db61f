//! Level meter sampler for a mounted view.
//!
//! Polls a metering node once per display frame and publishes
//! `max(rms, previous * 0.95)`: fast attack, slow release.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::graph::node::AnalyserNode;

/// Per-frame release factor applied to the previous displayed level.
pub const METER_DECAY: f32 = 0.95;

/// Shortest accepted frame interval.
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

/// Root-mean-square of a buffer; 0 for an empty one.
pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// The displayed level after one more frame.
pub fn next_level(buffer: &[f32], previous: f32) -> f32 {
    rms_level(buffer).max(previous * METER_DECAY)
}

/// A running sampler bound to one metering node.
///
/// Sampling stops on its own once the node is disconnected, and is aborted
/// when the meter is dropped, so an unmounted view leaves no polling task
/// behind. Must be created inside a tokio runtime.
pub struct LevelMeter {
    level: watch::Receiver<f32>,
    task: JoinHandle<()>,
}

impl LevelMeter {
    /// Start sampling `node` every `frame_interval`, raised to at least
    /// [`MIN_FRAME_INTERVAL`].
    pub fn mount(node: AnalyserNode, frame_interval: Duration) -> Self {
        let (sender, level) = watch::channel(0.0);
        let frame_interval = frame_interval.max(MIN_FRAME_INTERVAL);
        let task = tokio::spawn(sample_loop(node, frame_interval, sender));
        Self { level, task }
    }

    /// Latest displayed level.
    pub fn level(&self) -> f32 {
        *self.level.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<f32> {
        self.level.clone()
    }

    pub fn is_sampling(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for LevelMeter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn sample_loop(node: AnalyserNode, frame_interval: Duration, sender: watch::Sender<f32>) {
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut buffer = vec![0.0; node.fft_size()];
    let mut level = 0.0;
    loop {
        ticker.tick().await;
        if !node.is_connected() {
            log::debug!("Metering node {} gone, meter stopped", node.id());
            break;
        }
        node.get_float_time_domain_data(&mut buffer);
        level = next_level(&buffer, level);
        if sender.send(level).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn rms_of_constant_and_silence() {
        assert_eq!(rms_level(&[]), 0.0);
        assert_eq!(rms_level(&[0.0; 8]), 0.0);
        assert_relative_eq!(rms_level(&[0.5, -0.5, 0.5, -0.5]), 0.5);
    }

    #[test]
    fn fast_attack_slow_release() {
        let loud = [0.8; 16];
        let quiet = [0.0; 16];

        let attacked = next_level(&loud, 0.1);
        assert_relative_eq!(attacked, 0.8);

        let released = next_level(&quiet, attacked);
        assert_relative_eq!(released, 0.8 * 0.95);
        assert!(next_level(&quiet, released) < released);
    }

    #[tokio::test(start_paused = true)]
    async fn samples_until_node_disconnects() {
        let node = AnalyserNode::new(1024);
        node.process(&[0.5; 1024]);

        let meter = LevelMeter::mount(node.clone(), FRAME);
        tokio::time::sleep(FRAME * 2).await;
        assert_relative_eq!(meter.level(), 0.5, epsilon = 1e-5);
        assert!(meter.is_sampling());

        node.process(&[0.0; 1024]);
        tokio::time::sleep(FRAME * 3).await;
        let decayed = meter.level();
        assert!(decayed < 0.5 && decayed > 0.3, "decayed to {}", decayed);

        node.disconnect();
        tokio::time::sleep(FRAME * 2).await;
        assert!(!meter.is_sampling());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_sampling() {
        let node = AnalyserNode::new(1024);
        let meter = LevelMeter::mount(node, FRAME);
        let mut level = meter.subscribe();
        level.borrow_and_update();

        drop(meter);
        tokio::time::sleep(FRAME * 4).await;
        assert!(level.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_samples_at_the_minimum_rate() {
        let node = AnalyserNode::new(1024);
        node.process(&[0.25; 1024]);

        let meter = LevelMeter::mount(node, Duration::ZERO);
        tokio::time::sleep(MIN_FRAME_INTERVAL * 3).await;

        assert!(meter.is_sampling());
        assert_relative_eq!(meter.level(), 0.25, epsilon = 1e-5);
    }
}
