//! Presentation surface
//!
//! The controller never renders anything itself. It reports every visible
//! change through `Presenter`; `EventPresenter` turns those calls into
//! `MixerEvent`s for SSE clients.

use ambimix_common::events::{EventBus, MixerEvent, NoticeLevel, TrackInfo};
use ambimix_common::time::now;

pub trait Presenter: Send {
    fn render_tracks(&self, tracks: &[TrackInfo]);
    fn set_track_playing(&self, track_id: &str, playing: bool);
    fn set_track_volume_display(&self, track_id: &str, volume: u8);
    fn set_master_volume_display(&self, volume: u8);
    fn set_main_play_state(&self, playing: bool);
    fn set_active_preset_highlight(&self, preset_id: Option<&str>);
    fn add_preset_button(&self, name: &str, preset_id: &str);
    fn remove_preset_button(&self, preset_id: &str);
    fn set_timer_display(&self, minutes: u32, seconds: u32);
    fn show_save_dialog(&self);
    fn hide_save_dialog(&self);
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Presenter that broadcasts each update on an `EventBus`
#[derive(Debug, Clone)]
pub struct EventPresenter {
    bus: EventBus,
}

impl EventPresenter {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl Presenter for EventPresenter {
    fn render_tracks(&self, tracks: &[TrackInfo]) {
        self.bus.emit_lossy(MixerEvent::TracksRendered {
            tracks: tracks.to_vec(),
            timestamp: now(),
        });
    }

    fn set_track_playing(&self, track_id: &str, playing: bool) {
        self.bus.emit_lossy(MixerEvent::TrackPlayingChanged {
            track_id: track_id.to_string(),
            playing,
            timestamp: now(),
        });
    }

    fn set_track_volume_display(&self, track_id: &str, volume: u8) {
        self.bus.emit_lossy(MixerEvent::TrackVolumeChanged {
            track_id: track_id.to_string(),
            volume,
            timestamp: now(),
        });
    }

    fn set_master_volume_display(&self, volume: u8) {
        self.bus.emit_lossy(MixerEvent::MasterVolumeChanged {
            volume,
            timestamp: now(),
        });
    }

    fn set_main_play_state(&self, playing: bool) {
        self.bus.emit_lossy(MixerEvent::MainPlayStateChanged {
            playing,
            timestamp: now(),
        });
    }

    fn set_active_preset_highlight(&self, preset_id: Option<&str>) {
        self.bus.emit_lossy(MixerEvent::ActivePresetChanged {
            preset_id: preset_id.map(str::to_string),
            timestamp: now(),
        });
    }

    fn add_preset_button(&self, name: &str, preset_id: &str) {
        self.bus.emit_lossy(MixerEvent::PresetAdded {
            preset_id: preset_id.to_string(),
            name: name.to_string(),
            timestamp: now(),
        });
    }

    fn remove_preset_button(&self, preset_id: &str) {
        self.bus.emit_lossy(MixerEvent::PresetRemoved {
            preset_id: preset_id.to_string(),
            timestamp: now(),
        });
    }

    fn set_timer_display(&self, minutes: u32, seconds: u32) {
        self.bus.emit_lossy(MixerEvent::TimerDisplay {
            minutes,
            seconds,
            timestamp: now(),
        });
    }

    fn show_save_dialog(&self) {
        self.bus.emit_lossy(MixerEvent::SaveDialogShown { timestamp: now() });
    }

    fn hide_save_dialog(&self) {
        self.bus.emit_lossy(MixerEvent::SaveDialogHidden { timestamp: now() });
    }

    fn notify(&self, level: NoticeLevel, message: &str) {
        self.bus.emit_lossy(MixerEvent::Notice {
            level,
            message: message.to_string(),
            timestamp: now(),
        });
    }
}
