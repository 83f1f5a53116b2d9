//! Core error type

use medminder_api::ErrorCode;
use medminder_util::{MedicineId, NotificationId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid medicine: {0}")]
    InvalidMedicine(String),

    #[error("Unknown medicine: {0}")]
    UnknownMedicine(MedicineId),

    #[error("Unknown notification: {0}")]
    UnknownNotification(NotificationId),
}

impl CoreError {
    /// Protocol error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::InvalidSchedule(_) => ErrorCode::InvalidSchedule,
            CoreError::InvalidMedicine(_) => ErrorCode::InvalidRequest,
            CoreError::UnknownMedicine(_) => ErrorCode::UnknownMedicine,
            CoreError::UnknownNotification(_) => ErrorCode::UnknownNotification,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
