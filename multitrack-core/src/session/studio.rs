use std::sync::Arc;

use parking_lot::Mutex;

use super::lifecycle::{AttachOutcome, TrackLifecycleManager};
use super::recorder::{RecordingToggle, ToggleOutcome};
use super::track_store::TrackStore;
use crate::display::interval::format_interval;
use crate::display::meter::LevelMeter;
use crate::graph::bus::MixBus;
use crate::graph::context::AudioContext;
use crate::graph::node::AnalyserNode;
use crate::models::audio_models::GraphDiagnostics;
use crate::models::config::StudioConfiguration;
use crate::models::error::TrackError;
use crate::models::state::{AttachState, RecorderState};
use crate::models::track::{Track, TrackId, TrackPatch};
use crate::traits::context_driver::ContextDriver;
use crate::traits::device_provider::DeviceProvider;
use crate::traits::encoder::EncoderFactory;
use crate::traits::studio_delegate::StudioDelegate;

/// Multitrack recorder orchestrator.
///
/// Generic over the device backend, the output clock and the recording
/// encoder. Owns the processing context and the one shared output tap that
/// every track feeds and every recording reads:
///
/// ```text
/// [track 1 pipeline] ─┐
/// [track 2 pipeline] ─┼→ [output tap] → [RecordingToggle / encoder]
/// [track N pipeline] ─┘
///        └──────────────→ [monitoring destination] → ContextDriver
/// ```
///
/// Adding a track and toggling recording first bring the context to
/// `Running`; if that fails the action does not happen and the error is
/// returned and reported.
pub struct Studio<P: DeviceProvider, D: ContextDriver, F: EncoderFactory> {
    config: StudioConfiguration,
    context: AudioContext,
    tap: MixBus,
    driver: D,
    store: Mutex<TrackStore>,
    lifecycle: TrackLifecycleManager<P>,
    recorder: RecordingToggle<F>,
    delegate: Option<Arc<dyn StudioDelegate>>,
}

impl<P: DeviceProvider, D: ContextDriver, F: EncoderFactory> Studio<P, D, F> {
    pub fn new(
        config: StudioConfiguration,
        provider: P,
        driver: D,
        encoders: F,
    ) -> Result<Self, TrackError> {
        config.validate().map_err(TrackError::ConfigurationFailed)?;

        let context = AudioContext::new(config.sample_rate, config.tap_buffer_samples());
        let tap = context.create_output_tap();
        log::info!(
            "Studio created at {} Hz (tap queue {} samples)",
            config.sample_rate,
            config.tap_buffer_samples()
        );

        Ok(Self {
            lifecycle: TrackLifecycleManager::new(provider, context.clone(), tap.clone()),
            recorder: RecordingToggle::new(encoders, tap.clone()),
            store: Mutex::new(TrackStore::new()),
            config,
            context,
            tap,
            driver,
            delegate: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn StudioDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &StudioConfiguration {
        &self.config
    }

    pub fn context(&self) -> &AudioContext {
        &self.context
    }

    /// The shared output tap. Lives as long as the studio.
    pub fn output_tap(&self) -> &MixBus {
        &self.tap
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn provider(&self) -> &P {
        self.lifecycle.provider()
    }

    // --- Track mutations ---

    /// `tracks/add`, then attach the new track to the default device.
    ///
    /// An attach failure is not an error here: the track exists, stays
    /// unattached, and the outcome says why.
    pub async fn add_track(&self) -> Result<(Track, AttachOutcome), TrackError> {
        self.ensure_running().await?;

        let track = self.store.lock().add();
        log::info!("Track {} added", track.id);
        self.notify_tracks_changed();

        let outcome = self.attach(track.id, &track.device_id).await;
        Ok((track, outcome))
    }

    /// `tracks/update`. A patch carrying a device id is a device selection
    /// and re-attaches the track, even when the id is unchanged.
    pub async fn update_track(
        &self,
        id: TrackId,
        patch: TrackPatch,
    ) -> Result<Option<AttachOutcome>, TrackError> {
        let update = self.store.lock().update(id, patch)?;
        self.notify_tracks_changed();

        match update.device_selected {
            Some(device_id) => Ok(Some(self.attach(id, &device_id).await)),
            None => Ok(None),
        }
    }

    /// `tracks/remove`. The pipeline is torn down before the record goes.
    pub fn remove_track(&self, id: TrackId) -> Result<Track, TrackError> {
        if !self.store.lock().contains(id) {
            return Err(TrackError::TrackNotFound(id));
        }

        self.lifecycle.detach(id);
        self.notify(|d| d.on_attach_state_changed(id, &AttachState::Unattached));

        let track = self.store.lock().remove(id)?;
        log::info!("Track {} removed", id);
        self.notify_tracks_changed();
        Ok(track)
    }

    async fn attach(&self, id: TrackId, device_id: &str) -> AttachOutcome {
        let ticket = self.lifecycle.begin_attach(id, device_id);
        self.notify_attach_state(id);

        let outcome = self.lifecycle.complete_attach(ticket).await;
        match &outcome {
            AttachOutcome::Attached => self.notify_attach_state(id),
            AttachOutcome::Failed(e) => {
                self.notify_attach_state(id);
                self.notify(|d| d.on_error(e));
            }
            // the newer attach reports its own transitions
            AttachOutcome::Superseded => {}
        }
        outcome
    }

    // --- Recording ---

    /// Start a recording session, or finish the running one.
    ///
    /// A finished artifact is also handed to the delegate.
    pub async fn toggle_recording(&self) -> Result<ToggleOutcome, TrackError> {
        self.ensure_running().await?;

        let result = self.recorder.toggle().await;
        let state = self.recorder.state();
        self.notify(|d| d.on_recording_state_changed(&state));

        match &result {
            Ok(ToggleOutcome::Finished(artifact)) => {
                self.notify(|d| d.on_recording_finished(artifact));
            }
            Ok(ToggleOutcome::Started { .. }) => {}
            Err(e) => self.notify(|d| d.on_error(e)),
        }
        result
    }

    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    /// Elapsed recording time as shown to the user, `"0"` when idle.
    pub fn recording_elapsed(&self) -> String {
        let elapsed = self.recorder.state().elapsed();
        format_interval(elapsed.as_secs_f64() * 1000.0)
    }

    // --- Read side ---

    pub fn tracks(&self) -> Vec<Track> {
        self.store.lock().list()
    }

    pub fn track(&self, id: TrackId) -> Option<Track> {
        self.store.lock().get(id).cloned()
    }

    /// Track id at a 0-based display position.
    pub fn track_at(&self, position: usize) -> Option<TrackId> {
        self.store.lock().id_at(position)
    }

    pub fn attach_state(&self, id: TrackId) -> AttachState {
        self.lifecycle.state(id)
    }

    pub fn metering_node(&self, id: TrackId) -> Option<AnalyserNode> {
        self.lifecycle.metering_node(id)
    }

    /// Start a level meter on the track's current metering node.
    ///
    /// `None` while the track has no live pipeline. Must be called inside a
    /// tokio runtime; dropping the meter stops it.
    pub fn mount_meter(&self, id: TrackId) -> Option<LevelMeter> {
        let node = self.lifecycle.metering_node(id)?;
        Some(LevelMeter::mount(node, self.config.meter_frame_interval()))
    }

    pub fn diagnostics(&self) -> GraphDiagnostics {
        GraphDiagnostics {
            tap_inputs: self.tap.input_count(),
            monitor_inputs: self.context.destination().input_count(),
            tap_sinks: self.tap.sink_count(),
        }
    }

    /// Tear every pipeline down and close the context.
    pub fn shutdown(&self) {
        self.lifecycle.detach_all();
        if let Err(e) = self.driver.suspend() {
            log::warn!("Failed to stop output clock: {}", e);
        }
        self.context.close();
        log::info!("Studio shut down");
    }

    // --- Internal ---

    async fn ensure_running(&self) -> Result<(), TrackError> {
        if let Err(e) = self.context.resume(&self.driver).await {
            log::error!("Audio context could not be resumed: {}", e);
            self.notify(|d| d.on_error(&e));
            return Err(e);
        }
        Ok(())
    }

    fn notify(&self, event: impl FnOnce(&dyn StudioDelegate)) {
        if let Some(delegate) = &self.delegate {
            event(delegate.as_ref());
        }
    }

    fn notify_tracks_changed(&self) {
        let tracks = self.tracks();
        self.notify(|d| d.on_tracks_changed(&tracks));
    }

    fn notify_attach_state(&self, id: TrackId) {
        let state = self.lifecycle.state(id);
        self.notify(|d| d.on_attach_state_changed(id, &state));
    }
}
