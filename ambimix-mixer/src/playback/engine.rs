//! Playback engine - one audio handle per track
//!
//! Translates abstract transport commands into handle side effects. Unknown
//! track ids never fail hard: the command is dropped and a warning logged.

use super::backend::{AudioBackend, AudioHandle};
use crate::error::{LoadError, PlayError};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Transport interface consumed by the mixer controller
pub trait Playback: Send {
    /// Register a handle for `track_id`; a failure only affects that track
    fn load(&mut self, track_id: &str, resource: &str) -> Result<(), LoadError>;

    /// Begin or resume looped playback
    fn play(&mut self, track_id: &str) -> Result<(), PlayError>;

    /// Stop playback without resetting position (idempotent)
    fn pause(&mut self, track_id: &str);

    /// Pause and reset position to the start (idempotent)
    fn stop(&mut self, track_id: &str);

    /// Set audible output level, 0-100
    fn set_volume(&mut self, track_id: &str, percent: u8);

    /// Audible output level last applied, None for unknown tracks
    fn volume(&self, track_id: &str) -> Option<u8>;

    fn is_playing(&self, track_id: &str) -> bool;

    fn any_playing(&self) -> bool;
}

/// Default `Playback` implementation backed by an `AudioBackend`
pub struct PlaybackEngine {
    backend: Box<dyn AudioBackend>,
    tracks: HashMap<String, Box<dyn AudioHandle>>,
}

impl PlaybackEngine {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            tracks: HashMap::new(),
        }
    }

    /// Current position of a track, None for unknown tracks
    pub fn position(&self, track_id: &str) -> Option<Duration> {
        self.tracks.get(track_id).map(|h| h.position())
    }

    fn handle_mut(
        &mut self,
        track_id: &str,
        operation: &str,
    ) -> Option<&mut Box<dyn AudioHandle>> {
        let handle = self.tracks.get_mut(track_id);
        if handle.is_none() {
            warn!("{}: unknown track '{}', ignoring", operation, track_id);
        }
        handle
    }
}

impl Playback for PlaybackEngine {
    fn load(&mut self, track_id: &str, resource: &str) -> Result<(), LoadError> {
        let handle = self.backend.open(track_id, resource)?;
        info!("Loaded track '{}' from {}", track_id, resource);
        if let Some(previous) = self.tracks.insert(track_id.to_string(), handle) {
            debug!(
                "Replaced handle for '{}' (was playing: {})",
                track_id,
                previous.is_playing()
            );
        }
        Ok(())
    }

    fn play(&mut self, track_id: &str) -> Result<(), PlayError> {
        match self.handle_mut(track_id, "play") {
            Some(handle) => {
                handle.play()?;
                debug!("Playing '{}'", track_id);
                Ok(())
            }
            None => Err(PlayError::Unavailable(track_id.to_string())),
        }
    }

    fn pause(&mut self, track_id: &str) {
        if let Some(handle) = self.handle_mut(track_id, "pause") {
            if handle.is_playing() {
                handle.pause();
                debug!("Paused '{}'", track_id);
            }
        }
    }

    fn stop(&mut self, track_id: &str) {
        if let Some(handle) = self.handle_mut(track_id, "stop") {
            handle.pause();
            handle.rewind();
        }
    }

    fn set_volume(&mut self, track_id: &str, percent: u8) {
        if let Some(handle) = self.handle_mut(track_id, "set_volume") {
            handle.set_gain(f32::from(percent.min(100)) / 100.0);
        }
    }

    fn volume(&self, track_id: &str) -> Option<u8> {
        self.tracks
            .get(track_id)
            .map(|h| (h.gain() * 100.0).round() as u8)
    }

    fn is_playing(&self, track_id: &str) -> bool {
        self.tracks
            .get(track_id)
            .map(|h| h.is_playing())
            .unwrap_or(false)
    }

    fn any_playing(&self) -> bool {
        self.tracks.values().any(|h| h.is_playing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::backend::VirtualBackend;

    fn engine_with(ids: &[&str]) -> PlaybackEngine {
        let mut engine = PlaybackEngine::new(Box::new(VirtualBackend::new()));
        for id in ids {
            engine.load(id, &format!("{}.mp3", id)).unwrap();
        }
        engine
    }

    #[test]
    fn test_load_failure_is_isolated() {
        let mut engine = engine_with(&["rain"]);
        assert!(engine.load("wind", "wind.txt").is_err());

        assert_eq!(engine.volume("rain"), Some(100));
        assert_eq!(engine.volume("wind"), None);
        engine.play("rain").unwrap();
        assert!(engine.is_playing("rain"));
    }

    #[test]
    fn test_play_pause_any_playing() {
        let mut engine = engine_with(&["rain", "wind"]);
        assert!(!engine.any_playing());

        engine.play("rain").unwrap();
        assert!(engine.is_playing("rain"));
        assert!(!engine.is_playing("wind"));
        assert!(engine.any_playing());

        engine.pause("rain");
        engine.pause("rain");
        assert!(!engine.any_playing());
    }

    #[test]
    fn test_stop_resets_position() {
        let mut engine = engine_with(&["rain"]);
        engine.play("rain").unwrap();
        std::thread::sleep(Duration::from_millis(5));
        engine.pause("rain");
        assert!(engine.position("rain").unwrap() > Duration::ZERO);

        engine.stop("rain");
        engine.stop("rain");
        assert_eq!(engine.position("rain"), Some(Duration::ZERO));
        assert!(!engine.is_playing("rain"));
    }

    #[test]
    fn test_unknown_track_is_a_no_op() {
        let mut engine = engine_with(&["rain"]);

        assert_eq!(
            engine.play("snow"),
            Err(PlayError::Unavailable("snow".to_string()))
        );
        engine.pause("snow");
        engine.stop("snow");
        engine.set_volume("snow", 40);

        assert_eq!(engine.volume("snow"), None);
        assert!(!engine.is_playing("snow"));
        assert!(!engine.any_playing());
    }

    #[test]
    fn test_set_volume() {
        let mut engine = engine_with(&["rain"]);
        assert_eq!(engine.volume("rain"), Some(100));

        engine.set_volume("rain", 40);
        assert_eq!(engine.volume("rain"), Some(40));

        engine.set_volume("rain", 250);
        assert_eq!(engine.volume("rain"), Some(100));
    }

    #[test]
    fn test_volume_reads_back_every_level() {
        let mut engine = engine_with(&["rain"]);
        for percent in 0..=100u8 {
            engine.set_volume("rain", percent);
            assert_eq!(engine.volume("rain"), Some(percent));
        }
    }
}
