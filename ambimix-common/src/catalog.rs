//! Static track and preset catalog
//!
//! Track descriptors and built-in presets are supplied at startup and never
//! change while the mixer runs. The built-in catalog can be replaced by a
//! TOML file:
//!
//! ```toml
//! [[tracks]]
//! id = "rain"
//! name = "Rain"
//! file = "rain.mp3"
//!
//! [presets.focus]
//! name = "Focus"
//! sounds = { rain = 30, cafe = 40 }
//! ```

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Immutable descriptor of one ambient sound source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier used by every mixer operation
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Audio resource, relative to the audio folder
    pub file: String,
}

impl Track {
    pub fn new(id: &str, name: &str, file: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            file: file.to_string(),
        }
    }
}

/// Named sparse snapshot of per-track volumes
///
/// Only tracks with a volume above zero appear in `sounds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub sounds: IndexMap<String, u8>,
}

impl Preset {
    /// Build a preset keeping only entries with volume > 0
    pub fn sparse<'a, I>(name: &str, volumes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u8)>,
    {
        let sounds = volumes
            .into_iter()
            .filter(|(_, volume)| *volume > 0)
            .map(|(id, volume)| (id.to_string(), volume.min(100)))
            .collect();

        Self {
            name: name.to_string(),
            sounds,
        }
    }
}

/// Track list plus the built-in preset table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub tracks: Vec<Track>,
    /// Built-in presets keyed by preset id
    #[serde(default)]
    pub presets: IndexMap<String, Preset>,
}

impl Catalog {
    /// The catalog shipped with the mixer
    pub fn builtin() -> Self {
        let tracks = vec![
            Track::new("rain", "Rain", "rain.mp3"),
            Track::new("ocean", "Ocean Waves", "ocean.mp3"),
            Track::new("birds", "Birds", "birds.mp3"),
            Track::new("fireplace", "Fireplace", "fireplace.mp3"),
            Track::new("thunder", "Thunder", "thunder.mp3"),
            Track::new("wind", "Wind", "wind.mp3"),
            Track::new("cafe", "Cafe", "cafe.mp3"),
            Track::new("night", "Night", "night.mp3"),
        ];

        let mut presets = IndexMap::new();
        presets.insert(
            "focus".to_string(),
            Preset::sparse("Focus", [("rain", 30), ("cafe", 40)]),
        );
        presets.insert(
            "relax".to_string(),
            Preset::sparse("Relax", [("ocean", 50), ("birds", 30)]),
        );
        presets.insert(
            "sleep".to_string(),
            Preset::sparse("Sleep", [("rain", 40), ("night", 50)]),
        );
        presets.insert(
            "nature".to_string(),
            Preset::sparse("Nature", [("birds", 60), ("wind", 30)]),
        );
        presets.insert(
            "storm".to_string(),
            Preset::sparse("Storm", [("rain", 70), ("thunder", 50), ("wind", 40)]),
        );

        Self { tracks, presets }
    }

    /// Load and validate a catalog from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a catalog from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check track id uniqueness and that built-in presets only reference
    /// known tracks with volumes in 1..=100
    pub fn validate(&self) -> Result<()> {
        if self.tracks.is_empty() {
            return Err(Error::InvalidInput("catalog has no tracks".to_string()));
        }

        let mut seen = HashSet::new();
        for track in &self.tracks {
            if track.id.is_empty() {
                return Err(Error::InvalidInput("track with empty id".to_string()));
            }
            if !seen.insert(track.id.as_str()) {
                return Err(Error::InvalidInput(format!("duplicate track id '{}'", track.id)));
            }
        }

        for (preset_id, preset) in &self.presets {
            for (track_id, volume) in &preset.sounds {
                if !seen.contains(track_id.as_str()) {
                    return Err(Error::InvalidInput(format!(
                        "preset '{}' references unknown track '{}'",
                        preset_id, track_id
                    )));
                }
                if *volume == 0 || *volume > 100 {
                    return Err(Error::InvalidInput(format!(
                        "preset '{}' has volume {} for '{}' (expected 1-100)",
                        preset_id, volume, track_id
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn contains_track(&self, id: &str) -> bool {
        self.track(id).is_some()
    }

    /// Track ids in catalog order
    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|t| t.id.as_str())
    }

    pub fn builtin_preset(&self, id: &str) -> Option<&Preset> {
        self.presets.get(id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
