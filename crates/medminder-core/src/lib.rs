//! Dose scheduling and notification trigger engine for medminderd
//!
//! This crate is the heart of medminderd, containing:
//! - Schedule model (daily slots, validation of new medicines)
//! - Dose projection (what is still ahead today)
//! - Classification (future, due now, overdue, taken)
//! - Notification triggering with dismissal and at-most-once alarms
//! - The adherence log
//!
//! Everything here is synchronous and takes "now" as a parameter; the
//! service owns the clock and the timers.

mod adherence;
mod classifier;
mod engine;
mod error;
mod events;
mod notifier;
mod projector;
mod schedule;

pub use adherence::*;
pub use classifier::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use notifier::*;
pub use projector::*;
pub use schedule::*;
