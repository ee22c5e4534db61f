use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::bus::{BusPort, MixBus, NodeId};
use crate::models::error::TrackError;
use crate::processing::analyser::Analyser;
use crate::traits::device_provider::{AudioBufferCallback, InputStream};

/// Graph entry point wrapping one device session's stream.
///
/// Owns the stream; [`disconnect`](Self::disconnect) stops it and silences
/// the callback even if the backend delivers one more buffer.
pub struct SourceNode {
    id: NodeId,
    device_id: String,
    stream: Mutex<Option<Box<dyn InputStream>>>,
    active: Arc<AtomicBool>,
}

impl SourceNode {
    pub(crate) fn new(stream: Box<dyn InputStream>) -> Self {
        Self {
            id: NodeId::next(),
            device_id: stream.device_id().to_string(),
            stream: Mutex::new(Some(stream)),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn start(&self, callback: AudioBufferCallback) -> Result<(), TrackError> {
        let active = Arc::clone(&self.active);
        let gated: AudioBufferCallback = Arc::new(move |samples: &[f32], rate: f64, channels: u16| {
            if active.load(Ordering::SeqCst) {
                callback(samples, rate, channels);
            }
        });

        match self.stream.lock().as_mut() {
            Some(stream) => stream.start(gated),
            None => Err(TrackError::GraphFailure(format!("{} already disconnected", self.id))),
        }
    }

    /// Stop the stream. Returns false if already disconnected.
    pub fn disconnect(&self) -> bool {
        self.active.store(false, Ordering::SeqCst);
        let Some(mut stream) = self.stream.lock().take() else {
            return false;
        };
        if let Err(e) = stream.stop() {
            log::warn!("Failed to stop input stream for {}: {}", self.device_id, e);
        }
        true
    }
}

impl fmt::Debug for SourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceNode")
            .field("id", &self.id)
            .field("device_id", &self.device_id)
            .field("active", &self.is_active())
            .finish()
    }
}

struct AnalyserShared {
    id: NodeId,
    analyser: Mutex<Analyser>,
    outputs: Mutex<Vec<(MixBus, BusPort)>>,
    connected: AtomicBool,
}

/// Last stage of a track chain: records a metering window and forwards
/// processed audio to every bus it is connected to.
///
/// Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct AnalyserNode {
    shared: Arc<AnalyserShared>,
}

impl AnalyserNode {
    pub fn new(fft_size: usize) -> Self {
        Self {
            shared: Arc::new(AnalyserShared {
                id: NodeId::next(),
                analyser: Mutex::new(Analyser::new(fft_size)),
                outputs: Mutex::new(Vec::new()),
                connected: AtomicBool::new(true),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.shared.id
    }

    pub fn fft_size(&self) -> usize {
        self.shared.analyser.lock().fft_size()
    }

    /// False once [`disconnect`](Self::disconnect) has run; the node is then
    /// no longer a valid metering source.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    pub fn connect(&self, bus: &MixBus) -> Result<(), TrackError> {
        if !self.is_connected() {
            return Err(TrackError::GraphFailure(format!(
                "{} is disconnected",
                self.shared.id
            )));
        }
        let mut outputs = self.shared.outputs.lock();
        if outputs.iter().any(|(existing, _)| existing.same_bus(bus)) {
            return Ok(());
        }
        let port = bus.connect(self.shared.id);
        outputs.push((bus.clone(), port));
        Ok(())
    }

    pub fn is_connected_to(&self, bus: &MixBus) -> bool {
        self.shared
            .outputs
            .lock()
            .iter()
            .any(|(existing, _)| existing.same_bus(bus))
    }

    /// Detach from every bus. Returns false if already disconnected.
    pub fn disconnect(&self) -> bool {
        if !self.shared.connected.swap(false, Ordering::SeqCst) {
            return false;
        }
        for (bus, _) in self.shared.outputs.lock().drain(..) {
            bus.disconnect(self.shared.id);
        }
        true
    }

    /// Copy the latest time-domain window into `dest`.
    pub fn get_float_time_domain_data(&self, dest: &mut [f32]) {
        self.shared.analyser.lock().time_domain_data(dest);
    }

    /// Record `block` and forward it downstream.
    pub(crate) fn process(&self, block: &[f32]) {
        if !self.is_connected() {
            return;
        }
        self.shared.analyser.lock().ingest(block);
        for (_, port) in self.shared.outputs.lock().iter() {
            port.lock().push(block);
        }
    }

    pub fn same_node(&self, other: &AnalyserNode) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for AnalyserNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyserNode")
            .field("id", &self.shared.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyser_forwards_to_every_bus() {
        let tap = MixBus::new("tap", 16);
        let monitor = MixBus::new("monitor", 16);
        let node = AnalyserNode::new(8);
        node.connect(&tap).unwrap();
        node.connect(&monitor).unwrap();
        node.connect(&tap).unwrap();

        node.process(&[0.5, -0.5]);

        assert_eq!(tap.input_count(), 1);
        assert_eq!(tap.render(2), vec![0.5, -0.5]);
        assert_eq!(monitor.render(2), vec![0.5, -0.5]);

        let mut window = [0.0; 2];
        node.get_float_time_domain_data(&mut window);
        assert_eq!(window, [0.5, -0.5]);
    }

    #[test]
    fn analyser_disconnect_is_idempotent() {
        let tap = MixBus::new("tap", 16);
        let node = AnalyserNode::new(8);
        node.connect(&tap).unwrap();

        assert!(node.disconnect());
        assert!(!node.disconnect());
        assert_eq!(tap.input_count(), 0);
        assert!(!node.is_connected());
        assert!(node.connect(&tap).is_err());

        node.process(&[1.0]);
        assert_eq!(tap.render(1), vec![0.0]);
    }
}
