//! Custom presets and their persistence

pub mod storage;
pub mod store;

pub use storage::{FileStorage, MemoryStorage, PresetStorage, STORAGE_KEY};
pub use store::PresetStore;
