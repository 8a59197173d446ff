//! Error types for ambimix-mixer
//!
//! Each failure class is handled where it occurs; none of them terminate
//! the mixer. `Error` is the umbrella returned by controller operations.

use std::path::PathBuf;
use thiserror::Error;

/// A track's audio resource could not be registered
///
/// The track stays unavailable for the rest of the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("unsupported audio resource '{resource}' for track '{track_id}'")]
    Unsupported { track_id: String, resource: String },

    #[error("audio resource for track '{track_id}' not found: {}", path.display())]
    Missing { track_id: String, path: PathBuf },
}

/// Playback could not start (transient)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("track '{0}' is not loaded")]
    Unavailable(String),

    #[error("playback of '{track_id}' refused: {reason}")]
    Refused { track_id: String, reason: String },
}

/// User input rejected before any state change
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no active sounds to save in preset")]
    NoActiveSounds,

    #[error("please enter a name for the preset")]
    EmptyName,

    #[error("preset '{0}' already exists")]
    DuplicateName(String),

    #[error("timer of {minutes} minutes is longer than the {max} minute limit")]
    TimerTooLong { minutes: i64, max: i64 },
}

/// Preset storage unavailable, unreadable or unwritable
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored presets are corrupt: {0}")]
    Corrupt(String),

    #[error("failed to encode presets: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Main error type for ambimix-mixer
#[derive(Error, Debug)]
pub enum Error {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Playback error: {0}")]
    Play(#[from] PlayError),

    /// Unknown track or preset id
    #[error("Unknown {kind} '{id}'")]
    NotFound { kind: &'static str, id: String },

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Bootstrap configuration or catalog problems
    #[error(transparent)]
    Common(#[from] ambimix_common::Error),

    /// The mixer service loop is no longer running
    #[error("Mixer service stopped")]
    ServiceStopped,
}

impl Error {
    pub fn track_not_found(id: &str) -> Self {
        Error::NotFound {
            kind: "track",
            id: id.to_string(),
        }
    }

    pub fn preset_not_found(id: &str) -> Self {
        Error::NotFound {
            kind: "preset",
            id: id.to_string(),
        }
    }
}

/// Convenience Result type using ambimix-mixer Error
pub type Result<T> = std::result::Result<T, Error>;
