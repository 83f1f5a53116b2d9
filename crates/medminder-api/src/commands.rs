//! Command types for the medminder protocol

use chrono::NaiveDate;
use medminder_util::{ClientId, MedicineId, NotificationId, TimeOfDay};
use serde::{Deserialize, Serialize};

use crate::{
    DoseView, HealthStatus, LogEntry, Medicine, NewMedicine, ServiceStateSnapshot, UpcomingDose,
    API_VERSION,
};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidSchedule,
    UnknownMedicine,
    UnknownNotification,
    StoreError,
    InternalError,
}

/// All possible commands from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Get current service state
    GetState,

    /// List registered medicines in insertion order
    ListMedicines,

    /// Register a new medicine
    AddMedicine { medicine: NewMedicine },

    /// Remove a medicine; its log entries are kept
    DeleteMedicine { medicine_id: MedicineId },

    /// Doses still ahead today, soonest first
    UpcomingDoses {
        /// Optional: truncate to the first `limit` doses
        limit: Option<usize>,
    },

    /// Every scheduled dose today with its classification
    TodayDoses,

    /// Mark a scheduled dose as taken
    TakeDose {
        medicine_id: MedicineId,
        time: TimeOfDay,
    },

    /// Mark the dose behind a notification as taken and dismiss it
    TakeFromNotification { notification_id: NotificationId },

    /// Dismiss a notification without recording a dose
    DismissNotification { notification_id: NotificationId },

    /// Play the alert sound again
    ReplayAlert,

    /// Toggle automatic alert sounds
    SetSoundEnabled { enabled: bool },

    /// Adherence log entries for one date (defaults to today)
    LogForDate { date: Option<NaiveDate> },

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    /// Unsubscribe from events
    UnsubscribeEvents,

    /// Get health status
    GetHealth,

    /// Ping for keepalive
    Ping,
}

impl Command {
    /// Whether handling this command changes the notification inputs
    /// (medicines, taken/dismissed sets, sound flag).
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::AddMedicine { .. }
                | Command::DeleteMedicine { .. }
                | Command::TakeDose { .. }
                | Command::TakeFromNotification { .. }
                | Command::DismissNotification { .. }
                | Command::SetSoundEnabled { .. }
        )
    }
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    State(ServiceStateSnapshot),
    Medicines { medicines: Vec<Medicine> },
    MedicineAdded(Medicine),
    MedicineDeleted { medicine_id: MedicineId },
    Upcoming { doses: Vec<UpcomingDose> },
    Doses { doses: Vec<DoseView> },
    DoseTaken(LogEntry),
    Dismissed { notification_id: NotificationId },
    AlertReplayed,
    SoundEnabled { enabled: bool },
    Log { entries: Vec<LogEntry> },
    Subscribed { client_id: ClientId },
    Unsubscribed,
    Health(HealthStatus),
    Pong,
}

/// Client connection info (set by IPC layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: ClientId,
    /// Unix UID if available
    pub uid: Option<u32>,
}

impl ClientInfo {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            uid: None,
        }
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }
}
