//! Mixer controller - orchestrates playback, presets and the timer
//!
//! Owns the single authoritative `MixState`. Every user intent mutates that
//! state synchronously, pushes the side effects into the `Playback`
//! implementation and reports visible changes through the `Presenter`.
//!
//! Volume composition: the level applied to a track is always
//! `effective_volume(track, master)` computed from the latest values of
//! both sliders. Paused tracks are re-levelled when they resume.

pub mod intent;
pub mod state;

pub use intent::{Intent, IntentOutcome};
pub use state::{
    effective_volume, MixSnapshot, MixState, TrackRuntimeState, DEFAULT_MASTER_VOLUME,
    DEFAULT_RESUME_VOLUME,
};

use crate::error::{Error, PlayError, Result, ValidationError};
use crate::playback::Playback;
use crate::presenter::Presenter;
use crate::presets::PresetStore;
use crate::timer::{Countdown, TickOutcome, Timer};
use ambimix_common::events::{NoticeLevel, TrackInfo};
use ambimix_common::{Catalog, Preset};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// A preset as listed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetEntry {
    pub id: String,
    pub name: String,
    pub sounds: IndexMap<String, u8>,
    pub custom: bool,
}

pub struct MixerController {
    catalog: Catalog,
    state: MixState,
    /// Last value pushed to the main play/pause button
    any_playing: bool,
    unavailable: HashSet<String>,
    playback: Box<dyn Playback>,
    presets: PresetStore,
    timer: Timer,
    presenter: Box<dyn Presenter>,
}

impl MixerController {
    /// Build the controller and bring the presentation up to date
    ///
    /// Every catalog track is loaded; a track that fails to load stays
    /// visible but unavailable for the session.
    pub fn new(
        catalog: Catalog,
        mut playback: Box<dyn Playback>,
        presets: PresetStore,
        timer: Timer,
        presenter: Box<dyn Presenter>,
        initial_master_volume: u8,
    ) -> Self {
        let mut unavailable = HashSet::new();
        for track in &catalog.tracks {
            if let Err(e) = playback.load(&track.id, &track.file) {
                warn!("Could not load sound '{}': {}", track.name, e);
                unavailable.insert(track.id.clone());
            }
        }

        let state = MixState::new(&catalog, initial_master_volume);
        let mut controller = Self {
            catalog,
            state,
            any_playing: false,
            unavailable,
            playback,
            presets,
            timer,
            presenter,
        };
        let track_ids: Vec<String> = controller.catalog.track_ids().map(String::from).collect();
        for id in &track_ids {
            controller.apply_effective_volume(id);
        }
        controller.present_initial_state();

        info!(
            "Mixer ready: {} tracks ({} unavailable), {} custom presets",
            controller.catalog.tracks.len(),
            controller.unavailable.len(),
            controller.presets.len()
        );
        controller
    }

    fn present_initial_state(&self) {
        let tracks: Vec<TrackInfo> = self
            .catalog
            .tracks
            .iter()
            .map(|t| TrackInfo {
                id: t.id.clone(),
                name: t.name.clone(),
                available: !self.unavailable.contains(&t.id),
            })
            .collect();
        self.presenter.render_tracks(&tracks);

        for (id, preset) in self.presets.list() {
            self.presenter.add_preset_button(&preset.name, id);
        }
        self.presenter.set_master_volume_display(self.state.master_volume);
        self.presenter.set_main_play_state(false);
    }

    // ------------------------------------------------------------------
    // Intent dispatch
    // ------------------------------------------------------------------

    pub fn handle_intent(&mut self, intent: Intent) -> Result<IntentOutcome> {
        debug!("Handling intent {:?}", intent);
        match intent {
            Intent::ToggleTrack { track_id } => self.toggle_track(&track_id)?,
            Intent::ToggleAll => self.toggle_all(),
            Intent::SetTrackVolume { track_id, volume } => {
                self.set_track_volume(&track_id, volume)?
            }
            Intent::SetMasterVolume { volume } => self.set_master_volume(volume),
            Intent::ApplyPreset { preset_id, custom } => self.apply_preset(&preset_id, custom)?,
            Intent::RequestSave => self.request_save()?,
            Intent::CancelSave => self.presenter.hide_save_dialog(),
            Intent::SavePreset { name } => {
                let preset_id = self.save_current_as_preset(&name)?;
                return Ok(IntentOutcome::PresetSaved { preset_id });
            }
            Intent::DeletePreset { preset_id } => self.delete_preset(&preset_id)?,
            Intent::StartTimer { minutes } => self.start_timer(minutes)?,
            Intent::StopTimer => self.stop_timer(),
            Intent::Reset => self.reset_to_default(),
        }
        Ok(IntentOutcome::Applied)
    }

    // ------------------------------------------------------------------
    // Track operations
    // ------------------------------------------------------------------

    /// Resume a paused track or pause a playing one
    ///
    /// Pausing zeroes the track's stored volume, so a preset saved later
    /// leaves it out. Resuming a track whose slider reads 0 brings it back
    /// at `DEFAULT_RESUME_VOLUME`.
    pub fn toggle_track(&mut self, track_id: &str) -> Result<()> {
        self.require_track(track_id)?;
        if self.unavailable.contains(track_id) {
            warn!("Audio for sound '{}' not loaded", track_id);
            return Err(PlayError::Unavailable(track_id.to_string()).into());
        }

        let result = if self.playback.is_playing(track_id) {
            self.playback.pause(track_id);
            self.set_stored_volume(track_id, 0);
            self.apply_effective_volume(track_id);
            self.mark_playing(track_id, false);
            Ok(())
        } else {
            if self.stored_volume(track_id) == 0 {
                self.set_stored_volume(track_id, DEFAULT_RESUME_VOLUME);
            }
            self.apply_effective_volume(track_id);
            self.start_track(track_id)
        };

        self.refresh_main_play_state();
        result
    }

    /// Pause everything if anything plays, otherwise resume every track
    ///
    /// Unlike `toggle_track`, pausing here keeps the per-track volumes.
    pub fn toggle_all(&mut self) {
        let ids = self.track_ids();

        if self.playback.any_playing() {
            info!("Pausing all sounds");
            for id in &ids {
                self.pause_track(id);
            }
        } else {
            info!("Playing all sounds");
            for id in &ids {
                if self.unavailable.contains(id) {
                    continue;
                }
                if self.stored_volume(id) == 0 {
                    self.set_stored_volume(id, DEFAULT_RESUME_VOLUME);
                }
                self.apply_effective_volume(id);
                // Failures are reported per track and do not stop the others
                let _ = self.start_track(id);
            }
        }

        self.refresh_main_play_state();
    }

    /// Change one slider; playing state is untouched
    pub fn set_track_volume(&mut self, track_id: &str, volume: u8) -> Result<()> {
        self.require_track(track_id)?;
        self.set_stored_volume(track_id, volume.min(100));
        self.apply_effective_volume(track_id);
        self.refresh_main_play_state();
        Ok(())
    }

    /// Change the master slider and re-level every playing track
    ///
    /// Paused tracks pick up the new master volume when they resume.
    pub fn set_master_volume(&mut self, volume: u8) {
        self.state.master_volume = volume.min(100);
        self.presenter.set_master_volume_display(self.state.master_volume);

        for id in self.track_ids() {
            if self.playback.is_playing(&id) {
                self.apply_effective_volume(&id);
            }
        }
        debug!("Master volume set to {}", self.state.master_volume);
    }

    // ------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------

    /// Replace the whole mix with a preset
    ///
    /// Unknown presets leave the state untouched.
    pub fn apply_preset(&mut self, preset_id: &str, custom: bool) -> Result<()> {
        let preset = match self.resolve_preset(preset_id, custom) {
            Some(preset) => preset,
            None => {
                error!("Preset {} not found", preset_id);
                self.presenter
                    .notify(NoticeLevel::Error, &format!("Preset {} not found", preset_id));
                return Err(Error::preset_not_found(preset_id));
            }
        };

        info!("Applying preset '{}' ({})", preset.name, preset_id);
        for id in self.track_ids() {
            self.stop_track(&id);
            self.set_stored_volume(&id, 0);
            self.apply_effective_volume(&id);
        }

        for (track_id, volume) in &preset.sounds {
            if !self.catalog.contains_track(track_id) {
                warn!("Preset {} references unknown track '{}'", preset_id, track_id);
                continue;
            }
            self.set_stored_volume(track_id, (*volume).min(100));
            if self.unavailable.contains(track_id) {
                warn!("Sound '{}' unavailable, leaving it silent", track_id);
                continue;
            }
            self.apply_effective_volume(track_id);
            let _ = self.start_track(track_id);
        }

        self.state.active_preset_id = Some(preset_id.to_string());
        self.presenter.set_active_preset_highlight(Some(preset_id));
        self.refresh_main_play_state();
        Ok(())
    }

    /// Open the save dialog if there is something to save
    pub fn request_save(&mut self) -> Result<()> {
        if !self.state.has_active_sounds() {
            return Err(self.reject(ValidationError::NoActiveSounds));
        }
        self.presenter.show_save_dialog();
        Ok(())
    }

    /// Persist the current slider values under `name`
    pub fn save_current_as_preset(&mut self, name: &str) -> Result<String> {
        if !self.state.has_active_sounds() {
            return Err(self.reject(ValidationError::NoActiveSounds));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(self.reject(ValidationError::EmptyName));
        }
        if self.presets.name_exists(name) {
            return Err(self.reject(ValidationError::DuplicateName(name.to_string())));
        }

        let volumes = self.state.sparse_volumes();
        let preset_id = match self
            .presets
            .save(name, volumes.iter().map(|(id, v)| (id.as_str(), *v)))
        {
            Ok(id) => id,
            Err(e) => {
                self.presenter
                    .notify(NoticeLevel::Error, &format!("Could not save preset: {}", e));
                return Err(e.into());
            }
        };

        self.presenter.add_preset_button(name, &preset_id);
        self.presenter.hide_save_dialog();
        Ok(preset_id)
    }

    /// Remove a custom preset
    pub fn delete_preset(&mut self, preset_id: &str) -> Result<()> {
        match self.presets.delete(preset_id) {
            Ok(true) => {
                self.presenter.remove_preset_button(preset_id);
                if self.state.active_preset_id.as_deref() == Some(preset_id) {
                    self.state.active_preset_id = None;
                    self.presenter.set_active_preset_highlight(None);
                }
                Ok(())
            }
            Ok(false) => {
                warn!("Cannot delete unknown preset {}", preset_id);
                Err(Error::preset_not_found(preset_id))
            }
            Err(e) => {
                self.presenter
                    .notify(NoticeLevel::Error, &format!("Could not delete preset: {}", e));
                Err(e.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Timer and reset
    // ------------------------------------------------------------------

    pub fn start_timer(&mut self, minutes: i64) -> Result<()> {
        match self.timer.start(minutes) {
            Ok(countdown) => {
                self.show_countdown(countdown);
                Ok(())
            }
            Err(reason) => Err(self.reject(reason)),
        }
    }

    pub fn stop_timer(&mut self) {
        let countdown = self.timer.stop();
        self.show_countdown(countdown);
    }

    /// Feed one tick from the timer's tick source
    pub fn timer_tick(&mut self, generation: u64) {
        match self.timer.tick(generation) {
            TickOutcome::Ignored => {}
            TickOutcome::Running(countdown) => self.show_countdown(countdown),
            TickOutcome::Completed => self.on_timer_complete(),
        }
    }

    /// Pause everything when the countdown runs out
    ///
    /// Per-track volumes are kept so the same mix can be resumed.
    pub fn on_timer_complete(&mut self) {
        info!("Timer finished, pausing all sounds");
        for id in self.track_ids() {
            self.pause_track(&id);
        }
        self.refresh_main_play_state();
        self.show_countdown(Countdown::CLEAR);
    }

    /// Stop everything and return to a silent mix at full master volume
    pub fn reset_to_default(&mut self) {
        info!("Resetting mixer to defaults");
        for id in self.track_ids() {
            self.stop_track(&id);
        }

        self.state.master_volume = DEFAULT_MASTER_VOLUME;
        self.presenter.set_master_volume_display(DEFAULT_MASTER_VOLUME);

        self.state.active_preset_id = None;
        self.presenter.set_active_preset_highlight(None);

        self.stop_timer();

        for id in self.track_ids() {
            self.set_stored_volume(&id, 0);
            self.apply_effective_volume(&id);
        }
        self.refresh_main_play_state();
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self) -> &MixState {
        &self.state
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_playing(&self) -> bool {
        self.any_playing
    }

    /// Level currently applied to a track's audio handle
    pub fn effective_volume_of(&self, track_id: &str) -> Option<u8> {
        self.playback.volume(track_id)
    }

    pub fn snapshot(&self) -> MixSnapshot {
        let unavailable_tracks: Vec<String> = self
            .catalog
            .track_ids()
            .filter(|id| self.unavailable.contains(*id))
            .map(str::to_string)
            .collect();

        MixSnapshot {
            mix: self.state.clone(),
            playing: self.any_playing,
            timer: self.timer.state(),
            unavailable_tracks,
        }
    }

    /// Built-in presets followed by custom presets in storage order
    pub fn preset_entries(&self) -> Vec<PresetEntry> {
        let builtin = self.catalog.presets.iter().map(|(id, p)| (id.as_str(), p, false));
        let custom = self.presets.list().map(|(id, p)| (id, p, true));

        builtin
            .chain(custom)
            .map(|(id, preset, custom)| PresetEntry {
                id: id.to_string(),
                name: preset.name.clone(),
                sounds: preset.sounds.clone(),
                custom,
            })
            .collect()
    }

    pub fn track_infos(&self) -> Vec<TrackInfo> {
        self.catalog
            .tracks
            .iter()
            .map(|t| TrackInfo {
                id: t.id.clone(),
                name: t.name.clone(),
                available: !self.unavailable.contains(&t.id),
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn track_ids(&self) -> Vec<String> {
        self.state.track_states.keys().cloned().collect()
    }

    fn require_track(&self, track_id: &str) -> Result<()> {
        if self.state.track_states.contains_key(track_id) {
            Ok(())
        } else {
            warn!("Unknown sound '{}'", track_id);
            Err(Error::track_not_found(track_id))
        }
    }

    fn resolve_preset(&self, preset_id: &str, custom: bool) -> Option<Preset> {
        if custom {
            self.presets.get(preset_id).cloned()
        } else {
            self.catalog.builtin_preset(preset_id).cloned()
        }
    }

    fn stored_volume(&self, track_id: &str) -> u8 {
        self.state.track(track_id).map(|t| t.volume).unwrap_or(0)
    }

    fn set_stored_volume(&mut self, track_id: &str, volume: u8) {
        if let Some(track) = self.state.track_states.get_mut(track_id) {
            track.volume = volume;
            self.presenter.set_track_volume_display(track_id, volume);
        }
    }

    fn mark_playing(&mut self, track_id: &str, playing: bool) {
        if let Some(track) = self.state.track_states.get_mut(track_id) {
            track.playing = playing;
            self.presenter.set_track_playing(track_id, playing);
        }
    }

    /// Pause without touching the stored volume
    fn pause_track(&mut self, track_id: &str) {
        if !self.unavailable.contains(track_id) {
            self.playback.pause(track_id);
        }
        self.mark_playing(track_id, false);
    }

    /// Pause and rewind without touching the stored volume
    fn stop_track(&mut self, track_id: &str) {
        if !self.unavailable.contains(track_id) {
            self.playback.stop(track_id);
        }
        self.mark_playing(track_id, false);
    }

    fn apply_effective_volume(&mut self, track_id: &str) {
        if self.unavailable.contains(track_id) {
            return;
        }
        let level = effective_volume(self.stored_volume(track_id), self.state.master_volume);
        self.playback.set_volume(track_id, level);
    }

    /// Start playback and keep the state in line with the outcome
    ///
    /// A refused start leaves the track paused (stored volume kept) and is
    /// reported to the user.
    fn start_track(&mut self, track_id: &str) -> Result<()> {
        match self.playback.play(track_id) {
            Ok(()) => {
                self.mark_playing(track_id, true);
                Ok(())
            }
            Err(e) => {
                warn!("Sound '{}' failed to play: {}", track_id, e);
                self.mark_playing(track_id, false);
                self.presenter.notify(NoticeLevel::Warning, &e.to_string());
                Err(e.into())
            }
        }
    }

    fn refresh_main_play_state(&mut self) {
        self.any_playing = self.playback.any_playing();
        self.presenter.set_main_play_state(self.any_playing);
    }

    fn show_countdown(&self, countdown: Countdown) {
        self.presenter
            .set_timer_display(countdown.minutes, countdown.seconds);
    }

    fn reject(&self, reason: ValidationError) -> Error {
        info!("Rejected: {}", reason);
        self.presenter.notify(NoticeLevel::Warning, &reason.to_string());
        reason.into()
    }
}
