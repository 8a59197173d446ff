//! User intents accepted by the mixer
//!
//! JSON form: `{"intent": "set_track_volume", "track_id": "rain", "volume": 80}`

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    ToggleTrack {
        track_id: String,
    },
    ToggleAll,
    SetTrackVolume {
        track_id: String,
        volume: u8,
    },
    SetMasterVolume {
        volume: u8,
    },
    ApplyPreset {
        preset_id: String,
        #[serde(default)]
        custom: bool,
    },
    /// Open the save dialog (refused when nothing is audible)
    RequestSave,
    CancelSave,
    SavePreset {
        name: String,
    },
    DeletePreset {
        preset_id: String,
    },
    /// Zero or negative minutes stop the timer
    StartTimer {
        minutes: i64,
    },
    StopTimer,
    Reset,
}

impl Intent {
    /// Volume carried by the intent, if any
    pub fn volume(&self) -> Option<u8> {
        match self {
            Intent::SetTrackVolume { volume, .. } | Intent::SetMasterVolume { volume } => {
                Some(*volume)
            }
            _ => None,
        }
    }
}

/// What a successfully handled intent produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntentOutcome {
    Applied,
    PresetSaved { preset_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_from_json() {
        let intent: Intent = serde_json::from_value(json!({
            "intent": "set_track_volume",
            "track_id": "rain",
            "volume": 80
        }))
        .unwrap();
        assert_eq!(
            intent,
            Intent::SetTrackVolume {
                track_id: "rain".to_string(),
                volume: 80
            }
        );
        assert_eq!(intent.volume(), Some(80));
    }

    #[test]
    fn test_apply_preset_defaults_to_builtin() {
        let intent: Intent =
            serde_json::from_value(json!({"intent": "apply_preset", "preset_id": "focus"})).unwrap();
        assert_eq!(
            intent,
            Intent::ApplyPreset {
                preset_id: "focus".to_string(),
                custom: false
            }
        );
    }

    #[test]
    fn test_unit_intents() {
        let intent: Intent = serde_json::from_value(json!({"intent": "toggle_all"})).unwrap();
        assert_eq!(intent, Intent::ToggleAll);
        assert_eq!(intent.volume(), None);
    }

    #[test]
    fn test_outcome_serialization() {
        let value = serde_json::to_value(IntentOutcome::PresetSaved {
            preset_id: "custom_1".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"outcome": "preset_saved", "preset_id": "custom_1"}));
    }
}
