//! Core events emitted by the engine

use chrono::NaiveDate;
use medminder_api::{NotificationView, RetireReason};
use medminder_host_api::AlertSound;
use medminder_util::NotificationId;

/// Events emitted by the core engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// A dose entered the notification window
    NotificationTriggered { notification: NotificationView },

    /// A notification left the due set
    NotificationRetired {
        notification_id: NotificationId,
        reason: RetireReason,
    },

    /// An alert sound should be played now
    AlertRequested {
        sound: AlertSound,
        /// Explicit replay, bypassing the at-most-once guard
        replay: bool,
    },

    /// The calendar day changed; dismissals and played alarms were reset
    DayRolledOver { date: NaiveDate },
}
