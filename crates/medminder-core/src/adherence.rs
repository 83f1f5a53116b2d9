//! Adherence log: append-only record of taken doses

use chrono::{DateTime, Local, NaiveDate};
use medminder_api::LogEntry;
use medminder_util::{MedicineId, TimeOfDay};

use crate::{TakenSet, scheduled_date};

/// In-memory adherence log with a taken-set index
#[derive(Debug, Clone, Default)]
pub struct AdherenceLog {
    entries: Vec<LogEntry>,
    taken: TakenSet,
}

impl AdherenceLog {
    pub fn new(entries: Vec<LogEntry>) -> Self {
        let taken = TakenSet::from_entries(&entries);
        Self { entries, taken }
    }

    /// Append a take of `time` at `now`.
    ///
    /// The entry is dated by the dose instance it settles, so a 23:55 dose
    /// taken at 00:02 is logged against the previous day. Repeated takes of
    /// the same slot are all recorded.
    pub fn record_taken(
        &mut self,
        medicine_id: MedicineId,
        medicine_name: String,
        time: TimeOfDay,
        now: &DateTime<Local>,
    ) -> LogEntry {
        let entry = LogEntry {
            medicine_id,
            medicine_name,
            time,
            taken_at: TimeOfDay::of(now),
            date: scheduled_date(time, now),
        };
        self.taken.insert(&entry);
        self.entries.push(entry.clone());
        entry
    }

    /// Entries recorded on `date`, in insertion order
    pub fn entries_for_date(&self, date: NaiveDate) -> Vec<LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.date == date)
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn taken(&self) -> &TakenSet {
        &self.taken
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
