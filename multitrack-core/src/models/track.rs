use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Device identifier a new track starts with.
pub const DEFAULT_DEVICE_ID: &str = "default";

/// Opaque unique track identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One independently configurable input channel.
///
/// Names are free text with no uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub device_id: String,
}

impl Track {
    /// A fresh track: empty name, default device.
    pub fn new() -> Self {
        Self {
            id: TrackId::new(),
            name: String::new(),
            device_id: DEFAULT_DEVICE_ID.to_string(),
        }
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial field map for `tracks/update`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackPatch {
    pub name: Option<String>,
    pub device_id: Option<String>,
}

impl TrackPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn device(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.device_id.is_none()
    }
}
