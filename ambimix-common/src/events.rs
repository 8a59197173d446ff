//! Event types for the ambimix event system
//!
//! Every presentation update the mixer produces is expressed as a
//! `MixerEvent` and broadcast through the `EventBus`. SSE clients render
//! the mixer from this stream alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Track information sent to clients when the track list is rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: String,
    pub name: String,
    /// False when the track failed to load and cannot be played this session
    pub available: bool,
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Mixer event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MixerEvent {
    /// Full track list rendered (sent once at startup)
    TracksRendered {
        tracks: Vec<TrackInfo>,
        timestamp: DateTime<Utc>,
    },

    /// A track's play/pause indicator changed
    TrackPlayingChanged {
        track_id: String,
        playing: bool,
        timestamp: DateTime<Utc>,
    },

    /// A track's volume slider changed (stored volume, not effective volume)
    TrackVolumeChanged {
        track_id: String,
        volume: u8,
        timestamp: DateTime<Utc>,
    },

    /// Master volume slider changed
    MasterVolumeChanged {
        volume: u8,
        timestamp: DateTime<Utc>,
    },

    /// Main play/pause button state changed
    MainPlayStateChanged {
        playing: bool,
        timestamp: DateTime<Utc>,
    },

    /// Highlighted preset changed (None clears the highlight)
    ActivePresetChanged {
        preset_id: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Custom preset button added
    PresetAdded {
        preset_id: String,
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// Custom preset button removed
    PresetRemoved {
        preset_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Countdown display update; (0, 0) clears the display
    TimerDisplay {
        minutes: u32,
        seconds: u32,
        timestamp: DateTime<Utc>,
    },

    /// Save-preset dialog opened
    SaveDialogShown {
        timestamp: DateTime<Utc>,
    },

    /// Save-preset dialog closed
    SaveDialogHidden {
        timestamp: DateTime<Utc>,
    },

    /// Message surfaced to the user (validation failures, playback problems)
    Notice {
        level: NoticeLevel,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl MixerEvent {
    /// Get event type as string for filtering and the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            MixerEvent::TracksRendered { .. } => "TracksRendered",
            MixerEvent::TrackPlayingChanged { .. } => "TrackPlayingChanged",
            MixerEvent::TrackVolumeChanged { .. } => "TrackVolumeChanged",
            MixerEvent::MasterVolumeChanged { .. } => "MasterVolumeChanged",
            MixerEvent::MainPlayStateChanged { .. } => "MainPlayStateChanged",
            MixerEvent::ActivePresetChanged { .. } => "ActivePresetChanged",
            MixerEvent::PresetAdded { .. } => "PresetAdded",
            MixerEvent::PresetRemoved { .. } => "PresetRemoved",
            MixerEvent::TimerDisplay { .. } => "TimerDisplay",
            MixerEvent::SaveDialogShown { .. } => "SaveDialogShown",
            MixerEvent::SaveDialogHidden { .. } => "SaveDialogHidden",
            MixerEvent::Notice { .. } => "Notice",
        }
    }
}

/// Broadcast bus for mixer events
///
/// Thin wrapper around `tokio::sync::broadcast`. Slow subscribers lose the
/// oldest events once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MixerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// ```
    /// use ambimix_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MixerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: MixerEvent,
    ) -> Result<usize, broadcast::error::SendError<MixerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MixerEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_uses_type_tag() {
        let event = MixerEvent::TrackVolumeChanged {
            track_id: "rain".to_string(),
            volume: 80,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TrackVolumeChanged");
        assert_eq!(json["track_id"], "rain");
        assert_eq!(json["volume"], 80);
    }

    #[test]
    fn test_event_type_method() {
        let event = MixerEvent::ActivePresetChanged {
            preset_id: None,
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type(), "ActivePresetChanged");
    }

    #[test]
    fn test_eventbus_emit_without_subscribers() {
        let bus = EventBus::new(10);
        let result = bus.emit(MixerEvent::SaveDialogShown {
            timestamp: Utc::now(),
        });
        assert!(result.is_err());

        // Lossy emit never fails
        bus.emit_lossy(MixerEvent::SaveDialogHidden {
            timestamp: Utc::now(),
        });
    }

    #[tokio::test]
    async fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let sent = bus
            .emit(MixerEvent::MainPlayStateChanged {
                playing: true,
                timestamp: Utc::now(),
            })
            .unwrap();
        assert_eq!(sent, 2);

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                MixerEvent::MainPlayStateChanged { playing, .. } => assert!(playing),
                other => panic!("unexpected event {:?}", other),
            }
        }
    }
}
