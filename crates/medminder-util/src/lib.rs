//! Shared utilities for medminder
//!
//! This crate provides:
//! - ID types (MedicineId, NotificationId, ClientId)
//! - Time utilities (mockable clock, time-of-day values, date parsing)
//! - Error types
//! - Default paths for socket, config, and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
