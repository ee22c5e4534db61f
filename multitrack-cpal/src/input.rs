//! Device sessions on cpal input streams.
//!
//! `cpal::Stream` is not `Send` on every host, so each opened device gets a
//! dedicated thread that builds, plays and finally drops the stream. `open`
//! settles once that thread reports the stream is live.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use multitrack_core::models::error::TrackError;
use multitrack_core::traits::device_provider::{AudioBufferCallback, DeviceProvider, InputStream};

use crate::devices::{find_input_device, map_build_error, map_config_error, map_play_error};

type CallbackSlot = Arc<Mutex<Option<AudioBufferCallback>>>;

/// Opens input devices of the default cpal host.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalDeviceProvider;

impl CpalDeviceProvider {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceProvider for CpalDeviceProvider {
    type Stream = CpalInputStream;

    async fn open(&self, device_id: &str) -> Result<CpalInputStream, TrackError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let slot: CallbackSlot = Arc::new(Mutex::new(None));

        let thread_slot = Arc::clone(&slot);
        let thread_device = device_id.to_string();
        let handle = thread::Builder::new()
            .name(format!("cpal-input-{}", device_id))
            .spawn(move || input_thread(thread_device, thread_slot, ready_tx, stop_rx))
            .map_err(|e| TrackError::Backend(format!("failed to spawn input thread: {}", e)))?;

        let ready = ready_rx
            .await
            .map_err(|_| TrackError::Backend(format!("input thread for {} exited", device_id)))?;
        if let Err(e) = ready {
            let _ = handle.join();
            return Err(e);
        }

        Ok(CpalInputStream {
            device_id: device_id.to_string(),
            slot,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

/// A live cpal input stream owned by one pipeline.
///
/// Buffers arriving before [`start`](InputStream::start) are dropped.
pub struct CpalInputStream {
    device_id: String,
    slot: CallbackSlot,
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl InputStream for CpalInputStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), TrackError> {
        if self.stop_tx.is_none() {
            return Err(TrackError::DeviceUnavailable(format!("{} was released", self.device_id)));
        }
        *self.slot.lock() = Some(callback);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TrackError> {
        self.slot.lock().take();
        // Dropping the sender wakes the stream thread.
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| TrackError::Backend(format!("input thread for {} panicked", self.device_id)))?;
            log::debug!("Released input device {}", self.device_id);
        }
        Ok(())
    }
}

impl Drop for CpalInputStream {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn input_thread(
    device_id: String,
    slot: CallbackSlot,
    ready: oneshot::Sender<Result<(), TrackError>>,
    stop: mpsc::Receiver<()>,
) {
    let stream = match open_stream(&device_id, slot) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        // Nobody is waiting for this session any more.
        return;
    }

    // Blocks until the owning CpalInputStream stops or is dropped.
    let _ = stop.recv();
    drop(stream);
}

fn open_stream(device_id: &str, slot: CallbackSlot) -> Result<cpal::Stream, TrackError> {
    let device = find_input_device(device_id)?;
    let supported = device
        .default_input_config()
        .map_err(|e| map_config_error(device_id, e))?;
    let format = supported.sample_format();
    let config: StreamConfig = supported.into();

    log::info!(
        "Opening {} ({} Hz, {} ch, {:?})",
        device_id,
        config.sample_rate.0,
        config.channels,
        format
    );

    let stream = match format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, device_id, slot),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, device_id, slot),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, device_id, slot),
        other => {
            return Err(TrackError::Backend(format!(
                "{}: unsupported sample format {:?}",
                device_id, other
            )))
        }
    }?;

    stream.play().map_err(|e| map_play_error(device_id, e))?;
    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    device_id: &str,
    slot: CallbackSlot,
) -> Result<cpal::Stream, TrackError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let sample_rate = config.sample_rate.0 as f64;
    let channels = config.channels;
    let error_device = device_id.to_string();
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let callback = slot.lock().clone();
                let Some(callback) = callback else {
                    return;
                };
                scratch.clear();
                scratch.extend(data.iter().map(|s| f32::from_sample(*s)));
                callback(&scratch, sample_rate, channels);
            },
            move |err| log::error!("Input stream error on {}: {}", error_device, err),
            None,
        )
        .map_err(|e| map_build_error(device_id, e))
}
