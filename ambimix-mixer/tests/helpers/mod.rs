//! Test helpers for ambimix-mixer integration tests
//!
//! - `Fixture`: a controller wired to in-memory storage, a manual tick
//!   source and an event receiver
//! - `ScriptedBackend`: an audio backend with per-track load/play failures

#![allow(dead_code)]

use ambimix_common::events::{EventBus, MixerEvent};
use ambimix_common::Catalog;
use ambimix_mixer::controller::MixerController;
use ambimix_mixer::error::{LoadError, PlayError};
use ambimix_mixer::playback::{AudioBackend, AudioHandle, PlaybackEngine, VirtualBackend};
use ambimix_mixer::presenter::EventPresenter;
use ambimix_mixer::presets::{MemoryStorage, PresetStore};
use ambimix_mixer::timer::{ManualTicker, Timer};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::broadcast;

pub struct Fixture {
    pub controller: MixerController,
    pub events: broadcast::Receiver<MixerEvent>,
    pub storage: MemoryStorage,
    pub ticker: ManualTicker,
}

impl Fixture {
    /// Builtin catalog, every track loads and plays
    pub fn new() -> Self {
        Self::build(Box::new(VirtualBackend::new()), MemoryStorage::new())
    }

    pub fn with_storage(storage: MemoryStorage) -> Self {
        Self::build(Box::new(VirtualBackend::new()), storage)
    }

    pub fn with_backend(backend: ScriptedBackend) -> Self {
        Self::build(Box::new(backend), MemoryStorage::new())
    }

    fn build(backend: Box<dyn AudioBackend>, storage: MemoryStorage) -> Self {
        let bus = EventBus::new(1024);
        let events = bus.subscribe();
        let ticker = ManualTicker::new();

        let controller = MixerController::new(
            Catalog::builtin(),
            Box::new(PlaybackEngine::new(backend)),
            PresetStore::open(Box::new(storage.clone())),
            Timer::new(Box::new(ticker.clone())),
            Box::new(EventPresenter::new(bus)),
            100,
        );

        Self {
            controller,
            events,
            storage,
            ticker,
        }
    }

    /// Events emitted since the last drain
    pub fn drain(&mut self) -> Vec<MixerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Fire the armed tick source `count` times
    pub fn tick(&mut self, count: usize) {
        for _ in 0..count {
            let generation = self.ticker.armed().expect("no tick source armed");
            self.controller.timer_tick(generation);
        }
    }

    pub fn volume(&self, track_id: &str) -> u8 {
        self.controller.state().track(track_id).expect("unknown track").volume
    }

    pub fn playing(&self, track_id: &str) -> bool {
        self.controller.state().track(track_id).expect("unknown track").playing
    }

    /// Ids of tracks currently marked playing, in catalog order
    pub fn playing_tracks(&self) -> Vec<String> {
        self.controller
            .state()
            .track_states
            .iter()
            .filter(|(_, t)| t.playing)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// Backend that fails to load some tracks and refuses to play others
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    missing: HashSet<String>,
    refusing: HashSet<String>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing(mut self, track_id: &str) -> Self {
        self.missing.insert(track_id.to_string());
        self
    }

    pub fn refusing(mut self, track_id: &str) -> Self {
        self.refusing.insert(track_id.to_string());
        self
    }
}

impl AudioBackend for ScriptedBackend {
    fn open(&self, track_id: &str, resource: &str) -> Result<Box<dyn AudioHandle>, LoadError> {
        if self.missing.contains(track_id) {
            return Err(LoadError::Missing {
                track_id: track_id.to_string(),
                path: resource.into(),
            });
        }
        if self.refusing.contains(track_id) {
            return Ok(Box::new(RefusingHandle {
                track_id: track_id.to_string(),
                gain: 1.0,
            }));
        }
        VirtualBackend::new().open(track_id, resource)
    }
}

/// Handle whose every play attempt is refused
struct RefusingHandle {
    track_id: String,
    gain: f32,
}

impl AudioHandle for RefusingHandle {
    fn play(&mut self) -> Result<(), PlayError> {
        Err(PlayError::Refused {
            track_id: self.track_id.clone(),
            reason: "autoplay blocked".to_string(),
        })
    }

    fn pause(&mut self) {}

    fn rewind(&mut self) {}

    fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    fn gain(&self) -> f32 {
        self.gain
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn position(&self) -> Duration {
        Duration::ZERO
    }
}
