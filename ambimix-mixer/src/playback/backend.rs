//! Audio handle backends
//!
//! A backend turns a catalog resource into a playable handle. The mixer
//! performs no DSP itself; `VirtualBackend` models each handle's transport
//! (playing flag, gain, position clock) so the rest of the engine can be
//! driven and observed without an output device.

use crate::error::{LoadError, PlayError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

/// Container formats accepted as track resources
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "ogg", "wav", "flac", "m4a", "aac", "opus"];

/// One looping audio source
pub trait AudioHandle: Send {
    /// Begin or resume looped playback
    fn play(&mut self) -> Result<(), PlayError>;

    /// Stop output, keeping the current position
    fn pause(&mut self);

    /// Move the position back to the start
    fn rewind(&mut self);

    /// Output gain in 0.0..=1.0
    fn set_gain(&mut self, gain: f32);

    fn gain(&self) -> f32;

    fn is_playing(&self) -> bool;

    fn position(&self) -> Duration;
}

/// Factory for audio handles
pub trait AudioBackend: Send {
    fn open(&self, track_id: &str, resource: &str) -> Result<Box<dyn AudioHandle>, LoadError>;
}

/// Backend producing transport-only handles
#[derive(Debug, Clone, Default)]
pub struct VirtualBackend {
    audio_folder: Option<PathBuf>,
    verify_files: bool,
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve resources against `audio_folder`; with `verify_files` the
    /// file must exist at load time and at every play
    pub fn with_audio_folder(audio_folder: PathBuf, verify_files: bool) -> Self {
        Self {
            audio_folder: Some(audio_folder),
            verify_files,
        }
    }
}

fn has_supported_extension(resource: &str) -> bool {
    Path::new(resource)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

impl AudioBackend for VirtualBackend {
    fn open(&self, track_id: &str, resource: &str) -> Result<Box<dyn AudioHandle>, LoadError> {
        if !has_supported_extension(resource) {
            return Err(LoadError::Unsupported {
                track_id: track_id.to_string(),
                resource: resource.to_string(),
            });
        }

        let verified_path = match (&self.audio_folder, self.verify_files) {
            (Some(folder), true) => {
                let path = folder.join(resource);
                if !path.is_file() {
                    return Err(LoadError::Missing {
                        track_id: track_id.to_string(),
                        path,
                    });
                }
                Some(path)
            }
            _ => None,
        };

        debug!("Opened virtual handle for '{}' ({})", track_id, resource);
        Ok(Box::new(VirtualHandle::new(track_id, verified_path)))
    }
}

/// Transport state of one virtual track
#[derive(Debug)]
pub struct VirtualHandle {
    track_id: String,
    /// Checked on every play when set
    path: Option<PathBuf>,
    gain: f32,
    /// Set while playing
    started_at: Option<Instant>,
    /// Position accumulated before the current play span
    elapsed: Duration,
}

impl VirtualHandle {
    fn new(track_id: &str, path: Option<PathBuf>) -> Self {
        Self {
            track_id: track_id.to_string(),
            path,
            gain: 1.0,
            started_at: None,
            elapsed: Duration::ZERO,
        }
    }
}

impl AudioHandle for VirtualHandle {
    fn play(&mut self) -> Result<(), PlayError> {
        if let Some(path) = &self.path {
            if !path.is_file() {
                return Err(PlayError::Refused {
                    track_id: self.track_id.clone(),
                    reason: format!("{} is no longer available", path.display()),
                });
            }
        }

        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.elapsed += started.elapsed();
        }
    }

    fn rewind(&mut self) {
        self.elapsed = Duration::ZERO;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    fn gain(&self) -> f32 {
        self.gain
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    fn position(&self) -> Duration {
        match self.started_at {
            Some(started) => self.elapsed + started.elapsed(),
            None => self.elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_check() {
        assert!(has_supported_extension("rain.mp3"));
        assert!(has_supported_extension("RAIN.OGG"));
        assert!(has_supported_extension("nested/dir/wind.flac"));
        assert!(!has_supported_extension("rain.txt"));
        assert!(!has_supported_extension("rain"));
    }

    #[test]
    fn test_unsupported_resource_fails_to_load() {
        let backend = VirtualBackend::new();
        let result = backend.open("rain", "rain.midi");
        assert!(matches!(result, Err(LoadError::Unsupported { .. })));
    }

    #[test]
    fn test_missing_file_fails_only_when_verifying() {
        let dir = TempDir::new().unwrap();

        let lenient = VirtualBackend::with_audio_folder(dir.path().to_path_buf(), false);
        assert!(lenient.open("rain", "rain.mp3").is_ok());

        let strict = VirtualBackend::with_audio_folder(dir.path().to_path_buf(), true);
        match strict.open("rain", "rain.mp3") {
            Err(LoadError::Missing { track_id, path }) => {
                assert_eq!(track_id, "rain");
                assert_eq!(path, dir.path().join("rain.mp3"));
            }
            other => panic!("expected Missing, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_play_refused_when_file_disappears() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("wind.ogg");
        std::fs::write(&file, b"not really audio").unwrap();

        let backend = VirtualBackend::with_audio_folder(dir.path().to_path_buf(), true);
        let mut handle = backend.open("wind", "wind.ogg").unwrap();
        handle.play().unwrap();
        handle.pause();

        std::fs::remove_file(&file).unwrap();
        assert!(matches!(handle.play(), Err(PlayError::Refused { .. })));
        assert!(!handle.is_playing());
    }

    #[test]
    fn test_transport() {
        let mut handle = VirtualHandle::new("rain", None);
        assert!(!handle.is_playing());
        assert_eq!(handle.position(), Duration::ZERO);

        handle.play().unwrap();
        assert!(handle.is_playing());
        std::thread::sleep(Duration::from_millis(5));

        handle.pause();
        assert!(!handle.is_playing());
        let paused_at = handle.position();
        assert!(paused_at > Duration::ZERO);
        // Position holds while paused
        assert_eq!(handle.position(), paused_at);

        handle.rewind();
        assert_eq!(handle.position(), Duration::ZERO);
    }

    #[test]
    fn test_gain_is_clamped() {
        let mut handle = VirtualHandle::new("rain", None);
        handle.set_gain(1.5);
        assert_eq!(handle.gain(), 1.0);
        handle.set_gain(-0.2);
        assert_eq!(handle.gain(), 0.0);
    }
}
