//! Audit event types

use chrono::{DateTime, Local, NaiveDate};
use medminder_util::{MedicineId, NotificationId, TimeOfDay};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted { medicine_count: usize },

    /// Service stopped
    ServiceStopped,

    /// Medicine registered
    MedicineAdded {
        medicine_id: MedicineId,
        name: String,
    },

    /// Medicine removed
    MedicineDeleted { medicine_id: MedicineId },

    /// Dose recorded in the adherence log
    DoseTaken {
        medicine_id: MedicineId,
        time: TimeOfDay,
        date: NaiveDate,
    },

    /// Notification dismissed without a take
    NotificationDismissed { notification_id: NotificationId },

    /// A stored record could not be read and was replaced with empty data
    StorageRecovered { record: String, error: String },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: medminder_util::now(),
            event,
        }
    }
}
