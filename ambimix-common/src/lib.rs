//! # Ambimix Common Library
//!
//! Shared code for the ambient sound mixer:
//! - Event types (MixerEvent enum) and the EventBus
//! - Static track and built-in preset catalog
//! - Bootstrap configuration loading
//! - Utility functions

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use catalog::{Catalog, Preset, Track};
pub use error::{Error, Result};
