use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::processing::ring_buffer::RingBuffer;
use crate::traits::encoder::TapSink;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a node in the audio graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Write side of one node's connection into a bus.
pub type BusPort = Arc<Mutex<RingBuffer>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

struct BusInput {
    node: NodeId,
    port: BusPort,
}

struct BusShared {
    label: String,
    queue_capacity: usize,
    inputs: Mutex<Vec<BusInput>>,
    sinks: Mutex<Vec<(SinkId, Arc<dyn TapSink>)>>,
    next_sink: AtomicU64,
}

/// A summing node many producers connect into.
///
/// Serves both as the monitoring destination and as the shared output tap.
/// Each connected node gets its own pending-sample queue; a render pulls the
/// same number of samples from every queue and sums them. Connections are
/// per node, so disconnecting one producer never touches another's
/// contribution.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone)]
pub struct MixBus {
    shared: Arc<BusShared>,
}

impl MixBus {
    pub fn new(label: impl Into<String>, queue_capacity: usize) -> Self {
        Self {
            shared: Arc::new(BusShared {
                label: label.into(),
                queue_capacity,
                inputs: Mutex::new(Vec::new()),
                sinks: Mutex::new(Vec::new()),
                next_sink: AtomicU64::new(1),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Connect `node`, returning the port it writes into.
    ///
    /// Connecting an already-connected node returns its existing port.
    pub fn connect(&self, node: NodeId) -> BusPort {
        let mut inputs = self.shared.inputs.lock();
        if let Some(input) = inputs.iter().find(|input| input.node == node) {
            return Arc::clone(&input.port);
        }
        let port = Arc::new(Mutex::new(RingBuffer::new(self.shared.queue_capacity)));
        inputs.push(BusInput {
            node,
            port: Arc::clone(&port),
        });
        log::debug!("{} connected to {}", node, self.shared.label);
        port
    }

    /// Remove `node`'s contribution. Returns false if it was not connected.
    pub fn disconnect(&self, node: NodeId) -> bool {
        let mut inputs = self.shared.inputs.lock();
        let before = inputs.len();
        inputs.retain(|input| input.node != node);
        let removed = inputs.len() != before;
        if removed {
            log::debug!("{} disconnected from {}", node, self.shared.label);
        }
        removed
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.shared.inputs.lock().iter().any(|input| input.node == node)
    }

    pub fn input_count(&self) -> usize {
        self.shared.inputs.lock().len()
    }

    /// Register a consumer of every rendered block.
    pub fn add_sink(&self, sink: Arc<dyn TapSink>) -> SinkId {
        let id = SinkId(self.shared.next_sink.fetch_add(1, Ordering::Relaxed));
        self.shared.sinks.lock().push((id, sink));
        id
    }

    pub fn remove_sink(&self, id: SinkId) -> bool {
        let mut sinks = self.shared.sinks.lock();
        let before = sinks.len();
        sinks.retain(|(sink_id, _)| *sink_id != id);
        sinks.len() != before
    }

    pub fn sink_count(&self) -> usize {
        self.shared.sinks.lock().len()
    }

    /// Render `out.len()` samples: the sum of every input's pending samples,
    /// with silence where an input has run dry. The block is then handed to
    /// every sink.
    pub fn render_into(&self, out: &mut [f32]) {
        out.fill(0.0);
        {
            let inputs = self.shared.inputs.lock();
            for input in inputs.iter() {
                input.port.lock().mix_into(out);
            }
        }

        // Sinks run outside the lock so they may detach themselves.
        let sinks: Vec<Arc<dyn TapSink>> = self
            .shared
            .sinks
            .lock()
            .iter()
            .map(|(_, sink)| Arc::clone(sink))
            .collect();
        for sink in sinks {
            sink.on_block(out);
        }
    }

    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.render_into(&mut out);
        out
    }

    /// Whether two handles refer to the same bus.
    pub fn same_bus(&self, other: &MixBus) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for MixBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixBus")
            .field("label", &self.shared.label)
            .field("inputs", &self.input_count())
            .field("sinks", &self.sink_count())
            .finish()
    }
}
