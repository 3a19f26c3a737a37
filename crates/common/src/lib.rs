//! Karo Common Utilities
//!
//! Shared infrastructure for all Karo crates:
//! - Error types and result aliases
//! - Clocks (wall and virtual) and frame pacing for the playhead
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
