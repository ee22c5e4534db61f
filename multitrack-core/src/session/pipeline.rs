//! Per-track processing graph construction and teardown.
//!
//! ```text
//! [SourceNode] → compressor → gain → limiter → [AnalyserNode] ─┬→ shared output tap
//!                                                               └→ monitoring destination
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::device_session::DeviceSession;
use crate::graph::bus::MixBus;
use crate::graph::context::AudioContext;
use crate::graph::node::{AnalyserNode, SourceNode};
use crate::models::error::TrackError;
use crate::processing::chain::ProcessingChain;
use crate::processing::conversion::{downmix_to_mono, Resampler};
use crate::traits::device_provider::AudioBufferCallback;

/// Live handles of one built pipeline.
pub struct PipelineHandles {
    input: SourceNode,
    analyser: AnalyserNode,
}

impl PipelineHandles {
    pub fn input(&self) -> &SourceNode {
        &self.input
    }

    /// The metering node.
    pub fn analyser(&self) -> &AnalyserNode {
        &self.analyser
    }

    pub fn device_id(&self) -> &str {
        self.input.device_id()
    }

    pub fn is_live(&self) -> bool {
        self.input.is_active() && self.analyser.is_connected()
    }

    pub fn destroy(&self) {
        destroy(Some(self));
    }
}

impl fmt::Debug for PipelineHandles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineHandles")
            .field("input", &self.input)
            .field("analyser", &self.analyser)
            .finish()
    }
}

/// Build the fixed chain on top of `session` and wire it into `tap` and the
/// context's monitoring destination.
///
/// On failure everything built so far is torn down and the device released.
pub fn build(
    session: DeviceSession,
    context: &AudioContext,
    tap: &MixBus,
) -> Result<PipelineHandles, TrackError> {
    let input = SourceNode::new(session.into_stream());
    let analyser = context.create_analyser();
    let handles = PipelineHandles { input, analyser };

    let wired = handles
        .analyser
        .connect(tap)
        .and_then(|()| handles.analyser.connect(context.destination()));
    if let Err(e) = wired {
        handles.destroy();
        return Err(e);
    }

    let chain = Mutex::new(ProcessingChain::new(context.sample_rate()));
    let resampler = Mutex::new(Resampler::new(context.sample_rate()));
    let node = handles.analyser.clone();
    let callback: AudioBufferCallback = Arc::new(move |samples: &[f32], rate: f64, channels: u16| {
        let mono = downmix_to_mono(samples, channels as usize);
        let mut block = resampler.lock().resample(&mono, rate);
        chain.lock().process(&mut block);
        node.process(&block);
    });

    if let Err(e) = handles.input.start(callback) {
        log::warn!("Input stream for {} failed to start: {}", handles.device_id(), e);
        handles.destroy();
        return Err(e);
    }

    log::info!(
        "Pipeline built for {} ({} → {})",
        handles.device_id(),
        handles.input.id(),
        handles.analyser.id()
    );
    Ok(handles)
}

/// Disconnect the input and metering nodes.
///
/// Safe with absent handles and on handles already torn down.
pub fn destroy(handles: Option<&PipelineHandles>) {
    let Some(handles) = handles else {
        return;
    };
    let stopped = handles.input.disconnect();
    let detached = handles.analyser.disconnect();
    if stopped || detached {
        log::debug!("Pipeline for {} torn down", handles.device_id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::test_support::{running_context, ScriptedProvider};
    use crate::traits::encoder::TapSink;

    #[derive(Default)]
    struct CountSilence {
        silent: AtomicUsize,
        total: AtomicUsize,
    }

    impl TapSink for CountSilence {
        fn on_block(&self, samples: &[f32]) {
            let silent = samples.iter().filter(|s| s.abs() < 1e-6).count();
            self.silent.fetch_add(silent, Ordering::SeqCst);
            self.total.fetch_add(samples.len(), Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn build_wires_tap_and_destination() {
        let context = running_context().await;
        let tap = context.create_output_tap();
        let provider = ScriptedProvider::default();
        let session = DeviceSession::open(&provider, "mic-1").await.unwrap();

        let handles = build(session, &context, &tap).unwrap();
        assert!(handles.is_live());
        assert!(handles.analyser().is_connected_to(&tap));
        assert!(handles.analyser().is_connected_to(context.destination()));
        assert_eq!(handles.analyser().fft_size(), 1024);

        provider.stream("mic-1").unwrap().feed(&[0.1; 32]);
        let mut out = [0.0; 32];
        context.render(&mut out);
        assert!(out.iter().all(|s| (*s - 0.1).abs() < 1e-3));
    }

    #[tokio::test]
    async fn build_downmixes_and_resamples() {
        let context = running_context().await;
        let tap = context.create_output_tap();
        let provider = ScriptedProvider::default();
        let session = DeviceSession::open(&provider, "stereo").await.unwrap();
        let handles = build(session, &context, &tap).unwrap();

        // 8 stereo frames at 24 kHz; the last input sample is held for the next block
        provider.stream("stereo").unwrap().feed_with(&[0.2; 16], 24000.0, 2);
        let mut window = [0.0; 14];
        handles.analyser().get_float_time_domain_data(&mut window);
        assert!(window.iter().all(|s| (*s - 0.2).abs() < 1e-3));
    }

    #[tokio::test]
    async fn slower_device_keeps_the_tap_fed() {
        const QUANTUM: u64 = 512;

        let context = running_context().await;
        let tap = context.create_output_tap();
        let sink = Arc::new(CountSilence::default());
        tap.add_sink(sink.clone());

        let provider = ScriptedProvider::default();
        let session = DeviceSession::open(&provider, "usb-mic").await.unwrap();
        let _handles = build(session, &context, &tap).unwrap();
        let stream = provider.stream("usb-mic").unwrap();

        // Times in units of 1 / (44100 * 48000) s. A callback of 512 frames
        // arrives every 512 * 48000 units and a render quantum is due every
        // 512 * 44100 units, two callbacks behind the first input.
        let block = vec![0.2; QUANTUM as usize];
        let lead = 2 * QUANTUM * 48000;
        let mut callbacks = 0u64;
        let mut out = vec![0.0; QUANTUM as usize];
        for quantum in 0..(10 * 48000 / QUANTUM) {
            let due = lead + quantum * QUANTUM * 44100;
            while callbacks * QUANTUM * 48000 <= due {
                stream.feed_with(&block, 44100.0, 1);
                callbacks += 1;
            }
            context.render(&mut out);
            assert!(out.iter().all(|s| s.abs() > 1e-6), "monitor gap in quantum {}", quantum);
        }

        assert_eq!(sink.total.load(Ordering::SeqCst), 937 * 512);
        assert_eq!(sink.silent.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn destroy_is_idempotent() {
        let context = running_context().await;
        let tap = context.create_output_tap();
        let provider = ScriptedProvider::default();
        let session = DeviceSession::open(&provider, "mic-1").await.unwrap();
        let handles = build(session, &context, &tap).unwrap();

        destroy(Some(&handles));
        destroy(Some(&handles));
        destroy(None);

        assert!(!handles.is_live());
        assert_eq!(tap.input_count(), 0);
        assert_eq!(context.destination().input_count(), 0);
        assert!(provider.stream("mic-1").unwrap().is_stopped());
    }

    #[tokio::test]
    async fn failed_start_releases_everything() {
        let context = running_context().await;
        let tap = context.create_output_tap();
        let provider = ScriptedProvider::default();
        provider.fail_start("broken");
        let session = DeviceSession::open(&provider, "broken").await.unwrap();

        assert!(build(session, &context, &tap).is_err());
        assert_eq!(tap.input_count(), 0);
        assert!(provider.stream("broken").unwrap().is_stopped());
    }
}
