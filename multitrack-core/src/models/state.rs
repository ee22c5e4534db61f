use std::time::Instant;

use chrono::{DateTime, Utc};

/// Per-track pipeline attachment state.
///
/// ```text
/// Unattached → Attaching → Attached
///      ↑           │          │
///      └───────────┘   (device change / removal)
///      └────────── TearingDown ←┘
/// ```
///
/// `generation` is the selection counter value the attach belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AttachState {
    #[default]
    Unattached,
    Attaching { generation: u64, device_id: String },
    Attached { generation: u64, device_id: String },
    TearingDown,
}

impl AttachState {
    pub fn is_attached(&self) -> bool {
        matches!(self, Self::Attached { .. })
    }

    pub fn is_attaching(&self) -> bool {
        matches!(self, Self::Attaching { .. })
    }

    /// Device the track is attached or attaching to, if any.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Self::Attaching { device_id, .. } | Self::Attached { device_id, .. } => Some(device_id),
            _ => None,
        }
    }
}

/// Recording toggle state, derived from whether a session is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording {
        started_at: DateTime<Utc>,
        started: Instant,
    },
}

impl RecorderState {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    /// Time since the session started; zero when idle.
    pub fn elapsed(&self) -> std::time::Duration {
        match self {
            Self::Recording { started, .. } => started.elapsed(),
            Self::Idle => std::time::Duration::ZERO,
        }
    }
}
