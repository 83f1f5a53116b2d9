//! Core scheduling engine

use chrono::{DateTime, Local, NaiveDate};
use medminder_api::{
    DoseView, LogEntry, Medicine, NewMedicine, NotificationView, ServiceStateSnapshot,
    UpcomingDose, API_VERSION,
};
use medminder_host_api::AlertSound;
use medminder_store::{
    load_log, load_medicines, save_log, save_medicines, AuditEvent, AuditEventType, Store,
};
use medminder_util::{MedicineId, NotificationId, TimeOfDay};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    classify_today, has_slot, upcoming_doses, validate_new_medicine, AdherenceLog, CoreError,
    CoreEvent, CoreResult, NotificationTracker,
};

/// Engine behavior switches
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Play the alarm automatically when doses become due
    pub sound_enabled: bool,
    /// Ignore medicines outside their start/end dates
    pub respect_date_range: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            respect_date_range: false,
        }
    }
}

/// The core scheduling engine
pub struct CoreEngine {
    store: Arc<dyn Store>,
    medicines: Vec<Medicine>,
    log: AdherenceLog,
    notifications: NotificationTracker,
    sound_enabled: bool,
    respect_date_range: bool,
}

impl CoreEngine {
    /// Create a new core engine, loading medicines and the log from `store`
    pub fn new(store: Arc<dyn Store>, options: EngineOptions) -> Self {
        let medicines = load_medicines(store.as_ref());
        let log = AdherenceLog::new(load_log(store.as_ref()));

        info!(
            medicine_count = medicines.len(),
            log_entries = log.len(),
            sound_enabled = options.sound_enabled,
            "Core engine initialized"
        );

        Self {
            store,
            medicines,
            log,
            notifications: NotificationTracker::new(),
            sound_enabled: options.sound_enabled,
            respect_date_range: options.respect_date_range,
        }
    }

    /// Import seed medicines if none are registered yet.
    /// Returns the number imported.
    pub fn seed(&mut self, seeds: Vec<NewMedicine>, today: NaiveDate) -> usize {
        if !self.medicines.is_empty() || seeds.is_empty() {
            return 0;
        }

        for new in seeds {
            let name = new.name.clone();
            match validate_new_medicine(new, today) {
                Ok(medicine) => self.medicines.push(medicine),
                Err(e) => warn!(name = %name, error = %e, "Skipping invalid seed medicine"),
            }
        }

        let count = self.medicines.len();
        if count > 0 {
            self.persist_medicines();
            info!(count, "Seed medicines imported");
        }
        count
    }

    /// Registered medicines in insertion order
    pub fn medicines(&self) -> &[Medicine] {
        &self.medicines
    }

    pub fn medicine(&self, id: &MedicineId) -> Option<&Medicine> {
        self.medicines.iter().find(|m| &m.id == id)
    }

    /// Medicines that take part in scheduling on `date`
    fn scheduled_on(&self, date: NaiveDate) -> impl Iterator<Item = &Medicine> {
        let respect = self.respect_date_range;
        self.medicines
            .iter()
            .filter(move |m| !respect || m.is_active_on(date))
    }

    /// Validate and register a new medicine
    pub fn add_medicine(&mut self, new: NewMedicine, now: &DateTime<Local>) -> CoreResult<Medicine> {
        let medicine = validate_new_medicine(new, now.date_naive())?;

        self.medicines.push(medicine.clone());
        self.persist_medicines();
        self.audit(AuditEventType::MedicineAdded {
            medicine_id: medicine.id.clone(),
            name: medicine.name.clone(),
        });

        info!(
            medicine_id = %medicine.id,
            name = %medicine.name,
            frequency = %medicine.frequency,
            "Medicine added"
        );
        Ok(medicine)
    }

    /// Remove a medicine. Its log entries are kept.
    pub fn delete_medicine(&mut self, id: &MedicineId) -> CoreResult<Medicine> {
        let index = self
            .medicines
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| CoreError::UnknownMedicine(id.clone()))?;

        let medicine = self.medicines.remove(index);
        self.persist_medicines();
        self.audit(AuditEventType::MedicineDeleted {
            medicine_id: medicine.id.clone(),
        });

        info!(medicine_id = %medicine.id, name = %medicine.name, "Medicine deleted");
        Ok(medicine)
    }

    /// Doses still ahead today, optionally truncated to `limit`
    pub fn upcoming(&self, now: &DateTime<Local>, limit: Option<usize>) -> Vec<UpcomingDose> {
        let mut doses = upcoming_doses(self.scheduled_on(now.date_naive()), now);
        if let Some(limit) = limit {
            doses.truncate(limit);
        }
        doses
    }

    /// Every dose slot today, classified
    pub fn today_doses(&self, now: &DateTime<Local>) -> Vec<DoseView> {
        classify_today(self.scheduled_on(now.date_naive()), now, self.log.taken())
    }

    /// Record that the dose at slot `time` was taken now
    pub fn record_taken(
        &mut self,
        medicine_id: &MedicineId,
        time: TimeOfDay,
        now: &DateTime<Local>,
    ) -> CoreResult<LogEntry> {
        let name = self
            .medicine(medicine_id)
            .map(|m| m.name.clone())
            .ok_or_else(|| CoreError::UnknownMedicine(medicine_id.clone()))?;

        let entry = self.log.record_taken(medicine_id.clone(), name, time, now);
        self.persist_log();
        self.audit(AuditEventType::DoseTaken {
            medicine_id: entry.medicine_id.clone(),
            time: entry.time,
            date: entry.date,
        });

        info!(
            medicine_id = %entry.medicine_id,
            time = %entry.time,
            taken_at = %entry.taken_at,
            "Dose taken"
        );
        Ok(entry)
    }

    /// Record the dose behind a notification and dismiss it
    pub fn take_from_notification(
        &mut self,
        id: &NotificationId,
        now: &DateTime<Local>,
    ) -> CoreResult<LogEntry> {
        let medicine = self
            .medicine(id.medicine_id())
            .ok_or_else(|| CoreError::UnknownMedicine(id.medicine_id().clone()))?;
        if !has_slot(medicine, id.time()) {
            return Err(CoreError::UnknownNotification(id.clone()));
        }

        let entry = self.record_taken(id.medicine_id(), id.time(), now)?;
        self.notifications.dismiss(id.clone(), now);
        Ok(entry)
    }

    /// Dismiss the current instance of a notification without recording a dose
    pub fn dismiss_notification(
        &mut self,
        id: &NotificationId,
        now: &DateTime<Local>,
    ) -> CoreResult<()> {
        let known = self
            .medicine(id.medicine_id())
            .is_some_and(|m| has_slot(m, id.time()));
        if !known {
            return Err(CoreError::UnknownNotification(id.clone()));
        }

        if self.notifications.dismiss(id.clone(), now) {
            self.audit(AuditEventType::NotificationDismissed {
                notification_id: id.clone(),
            });
            info!(notification_id = %id, "Notification dismissed");
        } else {
            debug!(notification_id = %id, "Notification already dismissed");
        }
        Ok(())
    }

    /// Play the alarm again, regardless of what has already played
    pub fn replay_alert(&self) -> CoreEvent {
        debug!("Alert replay requested");
        CoreEvent::AlertRequested {
            sound: AlertSound::Alarm,
            replay: true,
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Returns whether the setting changed
    pub fn set_sound_enabled(&mut self, enabled: bool) -> bool {
        if self.sound_enabled == enabled {
            return false;
        }
        self.sound_enabled = enabled;
        info!(enabled, "Alert sound setting changed");
        true
    }

    /// Re-evaluate notifications at `now`
    pub fn tick(&mut self, now: &DateTime<Local>) -> Vec<CoreEvent> {
        let today = now.date_naive();
        let respect = self.respect_date_range;
        let scheduled = self
            .medicines
            .iter()
            .filter(|m| !respect || m.is_active_on(today));

        let evaluation =
            self.notifications
                .evaluate(scheduled, now, self.log.taken(), self.sound_enabled);

        let mut events = Vec::new();

        if let Some(date) = evaluation.rolled_over {
            info!(date = %date, "Day rolled over");
            events.push(CoreEvent::DayRolledOver { date });
        }

        for (notification_id, reason) in evaluation.retired {
            debug!(notification_id = %notification_id, ?reason, "Notification retired");
            events.push(CoreEvent::NotificationRetired {
                notification_id,
                reason,
            });
        }

        for notification in evaluation.triggered {
            info!(
                notification_id = %notification.id,
                medicine = %notification.dose.medicine_name,
                time = %notification.dose.time,
                "Dose due"
            );
            events.push(CoreEvent::NotificationTriggered { notification });
        }

        if evaluation.play_alarm {
            events.push(CoreEvent::AlertRequested {
                sound: AlertSound::Alarm,
                replay: false,
            });
        }

        events
    }

    /// Currently visible notifications
    pub fn notifications(&self) -> &[NotificationView] {
        self.notifications.due()
    }

    /// Log entries recorded on `date`
    pub fn log_for_date(&self, date: NaiveDate) -> Vec<LogEntry> {
        self.log.entries_for_date(date)
    }

    /// Get current service state snapshot
    pub fn get_state(&self, now: &DateTime<Local>) -> ServiceStateSnapshot {
        ServiceStateSnapshot {
            api_version: API_VERSION,
            today: now.date_naive(),
            medicine_count: self.medicines.len(),
            sound_enabled: self.sound_enabled,
            notifications: self.notifications.due().to_vec(),
            doses_today: self.today_doses(now),
        }
    }

    pub fn store_healthy(&self) -> bool {
        self.store.is_healthy()
    }

    fn persist_medicines(&self) {
        if let Err(e) = save_medicines(self.store.as_ref(), &self.medicines) {
            warn!(error = %e, "Failed to persist medicines");
        }
    }

    fn persist_log(&self) {
        if let Err(e) = save_log(self.store.as_ref(), self.log.entries()) {
            warn!(error = %e, "Failed to persist adherence log");
        }
    }

    fn audit(&self, event: AuditEventType) {
        if let Err(e) = self.store.append_audit(AuditEvent::new(event)) {
            warn!(error = %e, "Failed to append audit event");
        }
    }
}
