//! Ambient sound mixer (ambimix-mixer)
//!
//! State engine for layering looping ambient tracks: per-track and master
//! volume, built-in and custom presets, and a sleep timer. The engine is
//! owned by a single service task and driven over HTTP.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod playback;
pub mod presenter;
pub mod presets;
pub mod service;
pub mod timer;

pub use error::{Error, Result};
