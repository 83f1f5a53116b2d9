//! Event types for medminderd -> client streaming

use chrono::{DateTime, Local};
use medminder_util::{MedicineId, NotificationId};
use serde::{Deserialize, Serialize};

use crate::{DoseInstance, LogEntry, RetireReason, ServiceStateSnapshot, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: medminder_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Full state snapshot (sent on subscribe)
    StateChanged(ServiceStateSnapshot),

    /// Medicine list changed
    MedicinesChanged {
        added: Option<MedicineId>,
        removed: Option<MedicineId>,
        medicine_count: usize,
    },

    /// A dose entered the notification window
    NotificationTriggered {
        notification_id: NotificationId,
        dose: DoseInstance,
    },

    /// A notification left the due set
    NotificationRetired {
        notification_id: NotificationId,
        reason: RetireReason,
    },

    /// A dose was recorded in the adherence log
    DoseTaken { entry: LogEntry },

    /// Automatic alert sound toggled
    SoundSettingChanged { enabled: bool },

    /// Service is shutting down
    Shutdown,
}
