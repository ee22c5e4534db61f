//! Monitoring output: drives an `AudioContext`'s render clock from the
//! default cpal output device.

use std::sync::mpsc;
use std::thread;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use multitrack_core::graph::context::AudioContext;
use multitrack_core::models::error::TrackError;
use multitrack_core::traits::context_driver::ContextDriver;

use crate::devices::{find_default_output_device, map_build_error, map_play_error};

struct OutputThread {
    stop_tx: mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// Render clock on the default output device.
///
/// The output callback renders one mono quantum from the context per buffer
/// and copies it to every output channel.
#[derive(Default)]
pub struct CpalContextDriver {
    output: Mutex<Option<OutputThread>>,
}

impl CpalContextDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.output.lock().is_some()
    }
}

impl ContextDriver for CpalContextDriver {
    async fn resume(&self, context: AudioContext) -> Result<(), TrackError> {
        if self.is_running() {
            return Ok(());
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("cpal-output".into())
            .spawn(move || output_thread(context, ready_tx, stop_rx))
            .map_err(|e| TrackError::Backend(format!("failed to spawn output thread: {}", e)))?;

        let ready = ready_rx
            .await
            .map_err(|_| TrackError::Backend("output thread exited".into()))?;
        if let Err(e) = ready {
            let _ = handle.join();
            return Err(e);
        }

        *self.output.lock() = Some(OutputThread { stop_tx, handle });
        Ok(())
    }

    fn suspend(&self) -> Result<(), TrackError> {
        let Some(output) = self.output.lock().take() else {
            return Ok(());
        };
        drop(output.stop_tx);
        output
            .handle
            .join()
            .map_err(|_| TrackError::Backend("output thread panicked".into()))?;
        log::info!("Monitoring output stopped");
        Ok(())
    }
}

impl Drop for CpalContextDriver {
    fn drop(&mut self) {
        let _ = self.suspend();
    }
}

fn output_thread(
    context: AudioContext,
    ready: oneshot::Sender<Result<(), TrackError>>,
    stop: mpsc::Receiver<()>,
) {
    let stream = match open_output(context) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }
    let _ = stop.recv();
    drop(stream);
}

fn open_output(context: AudioContext) -> Result<cpal::Stream, TrackError> {
    const DEVICE: &str = "default output";

    let device = find_default_output_device()?;
    let rate = context.sample_rate().round() as u32;
    let supported = device
        .supported_output_configs()
        .map_err(|e| TrackError::Backend(format!("{}: {}", DEVICE, e)))?
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .find(|c| c.min_sample_rate().0 <= rate && rate <= c.max_sample_rate().0)
        .ok_or_else(|| TrackError::Backend(format!("{} does not support {} Hz f32 output", DEVICE, rate)))?
        .with_sample_rate(cpal::SampleRate(rate));
    let config: StreamConfig = supported.into();
    let channels = config.channels.max(1) as usize;

    log::info!("Monitoring output at {} Hz, {} ch", rate, channels);

    let mut mono: Vec<f32> = Vec::new();
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                mono.resize(frames, 0.0);
                context.render(&mut mono);
                for (frame, sample) in data.chunks_mut(channels).zip(mono.iter()) {
                    frame.fill(*sample);
                }
            },
            |err| log::error!("Monitoring output error: {}", err),
            None,
        )
        .map_err(|e| map_build_error(DEVICE, e))?;

    stream.play().map_err(|e| map_play_error(DEVICE, e))?;
    Ok(stream)
}
