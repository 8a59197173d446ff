//! Authoritative mix state

use crate::timer::TimerState;
use ambimix_common::Catalog;
use indexmap::IndexMap;
use serde::Serialize;

/// Volume a track resumes at when its slider reads 0
pub const DEFAULT_RESUME_VOLUME: u8 = 50;

/// Master volume after a reset
pub const DEFAULT_MASTER_VOLUME: u8 = 100;

/// Per-track mutable state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackRuntimeState {
    /// Slider value, 0-100
    pub volume: u8,
    pub playing: bool,
}

/// Everything that determines what is audible
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MixState {
    /// Keyed by track id, in catalog order
    pub track_states: IndexMap<String, TrackRuntimeState>,
    pub master_volume: u8,
    pub active_preset_id: Option<String>,
}

impl MixState {
    /// All tracks silent and paused
    pub fn new(catalog: &Catalog, master_volume: u8) -> Self {
        Self {
            track_states: catalog
                .track_ids()
                .map(|id| (id.to_string(), TrackRuntimeState::default()))
                .collect(),
            master_volume: master_volume.min(100),
            active_preset_id: None,
        }
    }

    pub fn track(&self, track_id: &str) -> Option<&TrackRuntimeState> {
        self.track_states.get(track_id)
    }

    /// True if any slider is above zero
    pub fn has_active_sounds(&self) -> bool {
        self.track_states.values().any(|t| t.volume > 0)
    }

    /// Slider values of every track, zeros included
    pub fn volumes(&self) -> impl Iterator<Item = (&str, u8)> {
        self.track_states
            .iter()
            .map(|(id, state)| (id.as_str(), state.volume))
    }

    /// Non-zero slider values only
    pub fn sparse_volumes(&self) -> IndexMap<String, u8> {
        self.volumes()
            .filter(|(_, volume)| *volume > 0)
            .map(|(id, volume)| (id.to_string(), volume))
            .collect()
    }
}

/// Output level actually applied to a track
///
/// `floor(track * master / 100)`, clamped to 100.
pub fn effective_volume(track_volume: u8, master_volume: u8) -> u8 {
    let product = u16::from(track_volume) * u16::from(master_volume) / 100;
    product.min(100) as u8
}

/// Read-only view of the mixer for API clients
#[derive(Debug, Clone, Serialize)]
pub struct MixSnapshot {
    #[serde(flatten)]
    pub mix: MixState,
    /// Aggregate "is anything playing" flag
    pub playing: bool,
    pub timer: TimerState,
    /// Tracks that failed to load this session
    pub unavailable_tracks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_volume() {
        assert_eq!(effective_volume(80, 50), 40);
        assert_eq!(effective_volume(33, 50), 16);
        assert_eq!(effective_volume(100, 100), 100);
        assert_eq!(effective_volume(0, 100), 0);
        assert_eq!(effective_volume(100, 0), 0);
        // Out-of-range inputs still clamp
        assert_eq!(effective_volume(200, 100), 100);
    }

    #[test]
    fn test_new_state_is_silent() {
        let catalog = Catalog::builtin();
        let state = MixState::new(&catalog, 100);

        assert_eq!(state.track_states.len(), catalog.tracks.len());
        assert!(!state.has_active_sounds());
        assert!(state.sparse_volumes().is_empty());
        assert_eq!(state.active_preset_id, None);
    }
}
