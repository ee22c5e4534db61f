//! Per-track attach / teardown state machine.
//!
//! Every device selection bumps the track's generation counter. An attach
//! only lands if its generation is still current when the device settles;
//! otherwise its session is released and the result discarded, so the last
//! selection issued wins no matter which open resolves first.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::device_session::DeviceSession;
use super::pipeline::{self, PipelineHandles};
use crate::graph::bus::MixBus;
use crate::graph::context::AudioContext;
use crate::graph::node::AnalyserNode;
use crate::models::error::TrackError;
use crate::models::state::AttachState;
use crate::models::track::TrackId;
use crate::traits::device_provider::DeviceProvider;

/// A started attach, to be settled with
/// [`complete_attach`](TrackLifecycleManager::complete_attach).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachTicket {
    pub track: TrackId,
    pub generation: u64,
    pub device_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached,
    /// A newer selection or a removal overtook this attach.
    Superseded,
    /// The track was left unattached.
    Failed(TrackError),
}

#[derive(Default)]
struct TrackSlot {
    generation: u64,
    state: AttachState,
    handles: Option<PipelineHandles>,
}

impl TrackSlot {
    fn tear_down(&mut self) {
        if let Some(handles) = self.handles.take() {
            self.state = AttachState::TearingDown;
            handles.destroy();
        }
        self.state = AttachState::Unattached;
    }
}

/// Owns each track's current pipeline and keeps it in step with the
/// track's device selection.
pub struct TrackLifecycleManager<P: DeviceProvider> {
    provider: P,
    context: AudioContext,
    tap: MixBus,
    slots: Mutex<HashMap<TrackId, TrackSlot>>,
}

impl<P: DeviceProvider> TrackLifecycleManager<P> {
    pub fn new(provider: P, context: AudioContext, tap: MixBus) -> Self {
        Self {
            provider,
            context,
            tap,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Register a device selection for `track`.
    ///
    /// Any live pipeline is torn down before this returns, and every attach
    /// already in flight for the track becomes stale.
    pub fn begin_attach(&self, track: TrackId, device_id: &str) -> AttachTicket {
        let mut slots = self.slots.lock();
        let slot = slots.entry(track).or_default();
        slot.tear_down();
        slot.generation += 1;
        slot.state = AttachState::Attaching {
            generation: slot.generation,
            device_id: device_id.to_string(),
        };
        log::debug!(
            "Track {} attaching to {} (generation {})",
            track,
            device_id,
            slot.generation
        );
        AttachTicket {
            track,
            generation: slot.generation,
            device_id: device_id.to_string(),
        }
    }

    /// Open the ticket's device and build its pipeline, unless a newer
    /// selection has been issued in the meantime.
    pub async fn complete_attach(&self, ticket: AttachTicket) -> AttachOutcome {
        let opened = DeviceSession::open(&self.provider, &ticket.device_id).await;

        let mut slots = self.slots.lock();
        let is_current = slots
            .get(&ticket.track)
            .is_some_and(|slot| slot.generation == ticket.generation);
        if !is_current {
            drop(slots);
            log::debug!(
                "Attach of track {} to {} superseded (generation {})",
                ticket.track,
                ticket.device_id,
                ticket.generation
            );
            if let Ok(session) = opened {
                session.close();
            }
            return AttachOutcome::Superseded;
        }
        let Some(slot) = slots.get_mut(&ticket.track) else {
            return AttachOutcome::Superseded;
        };

        let built = opened.and_then(|session| pipeline::build(session, &self.context, &self.tap));
        match built {
            Ok(handles) => {
                slot.tear_down();
                slot.handles = Some(handles);
                slot.state = AttachState::Attached {
                    generation: ticket.generation,
                    device_id: ticket.device_id.clone(),
                };
                log::info!("Track {} attached to {}", ticket.track, ticket.device_id);
                AttachOutcome::Attached
            }
            Err(e) => {
                slot.state = AttachState::Unattached;
                log::warn!(
                    "Track {} failed to attach to {}: {}",
                    ticket.track,
                    ticket.device_id,
                    e
                );
                AttachOutcome::Failed(e)
            }
        }
    }

    pub async fn attach(&self, track: TrackId, device_id: &str) -> AttachOutcome {
        let ticket = self.begin_attach(track, device_id);
        self.complete_attach(ticket).await
    }

    /// Tear down and forget `track`. In-flight attaches for it resolve as
    /// superseded. Returns false if the track had no live pipeline.
    pub fn detach(&self, track: TrackId) -> bool {
        let Some(mut slot) = self.slots.lock().remove(&track) else {
            return false;
        };
        let had_pipeline = slot.handles.is_some();
        slot.tear_down();
        had_pipeline
    }

    pub fn detach_all(&self) {
        let slots: Vec<TrackSlot> = self.slots.lock().drain().map(|(_, slot)| slot).collect();
        for mut slot in slots {
            slot.tear_down();
        }
    }

    pub fn state(&self, track: TrackId) -> AttachState {
        self.slots
            .lock()
            .get(&track)
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }

    /// The live metering node, if the track is attached.
    pub fn metering_node(&self, track: TrackId) -> Option<AnalyserNode> {
        self.slots
            .lock()
            .get(&track)
            .and_then(|slot| slot.handles.as_ref())
            .filter(|handles| handles.is_live())
            .map(|handles| handles.analyser().clone())
    }

    pub fn attached_count(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.handles.is_some())
            .count()
    }
}

impl<P: DeviceProvider> Drop for TrackLifecycleManager<P> {
    fn drop(&mut self) {
        self.detach_all();
    }
}
