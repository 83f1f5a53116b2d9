//! Host adapter trait interfaces for medminder
//!
//! This crate defines the capability-based interface between the service and
//! platform-specific audio and haptic implementations. It contains no
//! platform code itself.

mod alerts;
mod audio;
mod capabilities;
mod haptics;
mod mock;

pub use alerts::*;
pub use audio::*;
pub use capabilities::*;
pub use haptics::*;
pub use mock::*;
