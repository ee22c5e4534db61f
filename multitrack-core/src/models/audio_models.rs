use serde::{Deserialize, Serialize};

/// An audio input a track can be attached to, as reported by the
/// device-enumeration collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    pub id: String,
    pub label: String,
    pub is_default: bool,
}

/// Number of inputs currently feeding each bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphDiagnostics {
    pub tap_inputs: usize,
    pub monitor_inputs: usize,
    pub tap_sinks: usize,
}
