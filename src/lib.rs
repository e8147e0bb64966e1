//! vidcut video cut engine
//!
//! Cuts a time range out of a video by driving an external ffmpeg. A lossless
//! stream copy is tried first; if it fails the range is re-encoded once.
//!
//! # Features
//!
//! - Time parsing for seconds, `MM:SS` and `HH:MM:SS` with optional fractions
//! - Collision-free output naming (`demo_clip.mp4`, `demo_clip_1.mp4`, ...)
//! - Background cut jobs with progress events and cancellation
//! - Dual-handle range selection, loop preview and debounced thumbnails for
//!   interactive front ends

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::CutError;
pub use domain::model::{CutMode, CutOutcome, CutRequest, CutStrategy, TimeSpec};
pub use engine::{CutEngine, CutEvent, CutJob, EngineConfig};
