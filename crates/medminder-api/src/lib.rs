//! Data model and protocol types for medminder
//!
//! This crate defines the stable API between medminderd and clients:
//! - Medicines, dose instances, adherence log entries
//! - Commands (requests from clients) and responses
//! - Events (service -> clients)
//! - Versioning

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
