use std::collections::HashMap;

use crate::models::error::TrackError;
use crate::models::track::{Track, TrackId, TrackPatch};

/// Result of applying a [`TrackPatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackUpdate {
    pub track: Track,
    /// Set when the patch carried a device selection, even one equal to the
    /// current device: re-selecting is how a user retries a failed attach.
    pub device_selected: Option<String>,
}

/// The track collection: insertion-ordered ids plus an id → track map.
///
/// Both structures are only ever changed together.
#[derive(Debug, Default)]
pub struct TrackStore {
    order: Vec<TrackId>,
    tracks: HashMap<TrackId, Track>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `tracks/add`: a new track with an empty name on the default device.
    pub fn add(&mut self) -> Track {
        let track = Track::new();
        self.order.push(track.id);
        self.tracks.insert(track.id, track.clone());
        track
    }

    /// `tracks/update`: apply the fields present in `patch`.
    pub fn update(&mut self, id: TrackId, patch: TrackPatch) -> Result<TrackUpdate, TrackError> {
        let track = self.tracks.get_mut(&id).ok_or(TrackError::TrackNotFound(id))?;
        if let Some(name) = patch.name {
            track.name = name;
        }
        if let Some(device_id) = &patch.device_id {
            track.device_id = device_id.clone();
        }
        Ok(TrackUpdate {
            track: track.clone(),
            device_selected: patch.device_id,
        })
    }

    /// `tracks/remove`.
    pub fn remove(&mut self, id: TrackId) -> Result<Track, TrackError> {
        let track = self.tracks.remove(&id).ok_or(TrackError::TrackNotFound(id))?;
        self.order.retain(|existing| *existing != id);
        Ok(track)
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    /// Tracks in display order.
    pub fn list(&self) -> Vec<Track> {
        self.order
            .iter()
            .filter_map(|id| self.tracks.get(id))
            .cloned()
            .collect()
    }

    /// Id at a 0-based display position.
    pub fn id_at(&self, position: usize) -> Option<TrackId> {
        self.order.get(position).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
