#![warn(missing_docs)]
//! Sliding windows, glass doors and glass trapdoors, plus rain tapping on
//! nearby glass.
//!
//! The leaf behaviors live in `slidingwindows-world`; this crate wires them
//! up: behavior class registration, the rain-on-glass sampler with its
//! config file, and a headless demo that exercises everything end to end.

pub mod config;
pub mod headless;
pub mod mod_system;
pub mod rain;

pub use config::RainOnWindowsConfig;
pub use mod_system::SlidingWindowsModSystem;
pub use rain::{RainOnWindows, TickOutcome};
