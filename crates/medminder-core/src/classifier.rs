//! Due/overdue classification of dose instances

use chrono::{DateTime, Duration, Local, NaiveDate};
use medminder_api::{DoseStatus, DoseView, LogEntry, Medicine};
use medminder_util::{MedicineId, TimeOfDay};
use std::collections::HashSet;

use crate::scheduled_doses;

/// A dose is due now within this many minutes of its slot, either side
pub const DUE_NOW_WINDOW_MINUTES: i64 = 15;

/// Doses recorded as taken, keyed by medicine, slot and date
#[derive(Debug, Clone, Default)]
pub struct TakenSet {
    taken: HashSet<(MedicineId, TimeOfDay, NaiveDate)>,
}

impl TakenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> Self {
        let mut set = Self::new();
        for entry in entries {
            set.insert(entry);
        }
        set
    }

    pub fn insert(&mut self, entry: &LogEntry) {
        self.taken
            .insert((entry.medicine_id.clone(), entry.time, entry.date));
    }

    pub fn contains(&self, medicine_id: &MedicineId, time: TimeOfDay, date: NaiveDate) -> bool {
        self.taken.contains(&(medicine_id.clone(), time, date))
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

/// The occurrence of `time` (yesterday, today or tomorrow) closest to `now`.
///
/// Slots that do not exist locally on a date (DST gaps) are skipped.
pub fn nearest_occurrence(time: TimeOfDay, now: &DateTime<Local>) -> Option<DateTime<Local>> {
    let today = now.date_naive();
    [today.pred_opt(), Some(today), today.succ_opt()]
        .into_iter()
        .flatten()
        .filter_map(|date| time.on(date))
        .min_by_key(|occurrence| (*occurrence - *now).abs())
}

/// Absolute distance from `now` to the nearest occurrence of `time`
pub fn distance_to_slot(time: TimeOfDay, now: &DateTime<Local>) -> Option<(Duration, NaiveDate)> {
    nearest_occurrence(time, now).map(|occ| ((occ - *now).abs(), occ.date_naive()))
}

/// The date of the dose instance of `time` that an action at `now` refers to.
///
/// Inside the due-now window this is the nearest occurrence, which may be
/// yesterday or tomorrow. Outside it, today's slot.
pub fn scheduled_date(time: TimeOfDay, now: &DateTime<Local>) -> NaiveDate {
    match distance_to_slot(time, now) {
        Some((distance, date)) if distance <= Duration::minutes(DUE_NOW_WINDOW_MINUTES) => date,
        _ => now.date_naive(),
    }
}

/// Classify one dose slot at `now`.
///
/// Due-now uses the absolute distance to the slot's nearest occurrence, so
/// a 00:05 slot is due at 23:55 the night before. Overdue compares against
/// today's slot only. The taken lookup uses the date of the occurrence being
/// classified.
pub fn classify(
    medicine_id: &MedicineId,
    time: TimeOfDay,
    now: &DateTime<Local>,
    taken: &TakenSet,
) -> DoseStatus {
    let today = now.date_naive();

    if let Some((distance, date)) = distance_to_slot(time, now)
        && distance <= Duration::minutes(DUE_NOW_WINDOW_MINUTES)
    {
        return if taken.contains(medicine_id, time, date) {
            DoseStatus::Taken
        } else {
            DoseStatus::DueNow
        };
    }

    if taken.contains(medicine_id, time, today) {
        DoseStatus::Taken
    } else if now.time() > time.to_naive_time() {
        DoseStatus::Overdue
    } else {
        DoseStatus::Future
    }
}

/// Today's schedule for every medicine, classified, ordered by slot time
pub fn classify_today<'a>(
    medicines: impl IntoIterator<Item = &'a Medicine>,
    now: &DateTime<Local>,
    taken: &TakenSet,
) -> Vec<DoseView> {
    scheduled_doses(medicines)
        .into_iter()
        .map(|dose| {
            let status = classify(&dose.medicine_id, dose.time, now, taken);
            DoseView { dose, status }
        })
        .collect()
}
