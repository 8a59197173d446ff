//! Track playback: audio handles and the engine that owns them

pub mod backend;
pub mod engine;

pub use backend::{AudioBackend, AudioHandle, VirtualBackend, SUPPORTED_EXTENSIONS};
pub use engine::{Playback, PlaybackEngine};
