//! Error types for medminder

use thiserror::Error;

use crate::{MedicineId, NotificationId};

/// Shared error type for medminder value parsing and lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MedminderError {
    #[error("Invalid time of day '{value}': {reason}")]
    InvalidTimeOfDay { value: String, reason: String },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid notification id '{0}'")]
    InvalidNotificationId(String),

    #[error("Medicine not found: {0}")]
    MedicineNotFound(MedicineId),

    #[error("Notification not found: {0}")]
    NotificationNotFound(NotificationId),
}

impl MedminderError {
    pub fn time_of_day(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimeOfDay {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MedminderError>;
