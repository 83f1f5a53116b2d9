//! Notification trigger tracking

use chrono::{DateTime, Duration, Local, NaiveDate};
use medminder_api::{Medicine, NotificationView, RetireReason};
use medminder_util::NotificationId;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::{distance_to_slot, scheduled_date, scheduled_doses, TakenSet};

/// A dose enters the due set within this many minutes of its slot, either side
pub const NOTIFICATION_WINDOW_MINUTES: i64 = 5;

/// Outcome of one evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Newly due notifications
    pub triggered: Vec<NotificationView>,
    /// Notifications that left the due set
    pub retired: Vec<(NotificationId, RetireReason)>,
    /// The alarm should play (at most once per dose instance)
    pub play_alarm: bool,
    /// Set when this evaluation crossed into a new calendar day
    pub rolled_over: Option<NaiveDate>,
}

/// One dose instance: a notification id on the date of its occurrence
type Instance = (NotificationId, NaiveDate);

/// Live notification state.
///
/// Dismissals and played alarms are keyed by dose instance, so a 23:58
/// dose handled before midnight stays handled at 00:01. They are not
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct NotificationTracker {
    due: Vec<NotificationView>,
    due_on: HashMap<NotificationId, NaiveDate>,
    dismissed: HashSet<Instance>,
    sound_played: HashSet<Instance>,
    day: Option<NaiveDate>,
}

impl NotificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently visible notifications
    pub fn due(&self) -> &[NotificationView] {
        &self.due
    }

    pub fn is_due(&self, id: &NotificationId) -> bool {
        self.due_on.contains_key(id)
    }

    /// Whether the instance of `id` current at `now` was dismissed
    pub fn is_dismissed(&self, id: &NotificationId, now: &DateTime<Local>) -> bool {
        self.dismissed.contains(&instance_at(id, now))
    }

    /// Whether the alarm already played for the instance of `id` current at `now`
    pub fn has_played(&self, id: &NotificationId, now: &DateTime<Local>) -> bool {
        self.sound_played.contains(&instance_at(id, now))
    }

    /// Suppress the instance of `id` current at `now`. Returns false if it
    /// was already dismissed.
    pub fn dismiss(&mut self, id: NotificationId, now: &DateTime<Local>) -> bool {
        let date = scheduled_date(id.time(), now);
        self.dismissed.insert((id, date))
    }

    /// Every dose within the notification window that has not been taken
    pub fn compute_due<'a>(
        medicines: impl IntoIterator<Item = &'a Medicine>,
        now: &DateTime<Local>,
        taken: &TakenSet,
    ) -> Vec<NotificationView> {
        due_instances(medicines, now, taken)
            .into_iter()
            .map(|(view, _)| view)
            .collect()
    }

    /// Recompute the due set and report what changed
    pub fn evaluate<'a>(
        &mut self,
        medicines: impl IntoIterator<Item = &'a Medicine>,
        now: &DateTime<Local>,
        taken: &TakenSet,
        sound_enabled: bool,
    ) -> Evaluation {
        let mut evaluation = Evaluation::default();

        let today = now.date_naive();
        if self.day != Some(today) {
            if self.day.is_some() {
                // Yesterday's late doses can still be inside the window
                if let Some(yesterday) = today.pred_opt() {
                    self.dismissed.retain(|(_, date)| *date >= yesterday);
                    self.sound_played.retain(|(_, date)| *date >= yesterday);
                }
                debug!(date = %today, "New day, pruning old dose instances");
                evaluation.rolled_over = Some(today);
            }
            self.day = Some(today);
        }

        let next: Vec<(NotificationView, NaiveDate)> = due_instances(medicines, now, taken)
            .into_iter()
            .filter(|(n, date)| !self.dismissed.contains(&(n.id.clone(), *date)))
            .collect();

        for previous in &self.due {
            if next.iter().any(|(n, _)| n.id == previous.id) {
                continue;
            }
            let date = self
                .due_on
                .get(&previous.id)
                .copied()
                .unwrap_or(today);
            let reason = if self.dismissed.contains(&(previous.id.clone(), date)) {
                RetireReason::Dismissed
            } else if taken.contains(previous.id.medicine_id(), previous.id.time(), date) {
                RetireReason::Taken
            } else {
                RetireReason::NoLongerDue
            };
            evaluation.retired.push((previous.id.clone(), reason));
        }

        for (notification, _) in &next {
            if !self.is_due(&notification.id) {
                evaluation.triggered.push(notification.clone());
            }
        }

        if sound_enabled {
            let unplayed: Vec<Instance> = next
                .iter()
                .map(|(n, date)| (n.id.clone(), *date))
                .filter(|instance| !self.sound_played.contains(instance))
                .collect();
            if !unplayed.is_empty() {
                evaluation.play_alarm = true;
                self.sound_played.extend(unplayed);
            }
        }

        self.due_on = next
            .iter()
            .map(|(n, date)| (n.id.clone(), *date))
            .collect();
        self.due = next.into_iter().map(|(n, _)| n).collect();
        evaluation
    }
}

fn instance_at(id: &NotificationId, now: &DateTime<Local>) -> Instance {
    (id.clone(), scheduled_date(id.time(), now))
}

/// Due notifications paired with the date of the occurrence that is due
fn due_instances<'a>(
    medicines: impl IntoIterator<Item = &'a Medicine>,
    now: &DateTime<Local>,
    taken: &TakenSet,
) -> Vec<(NotificationView, NaiveDate)> {
    let window = Duration::minutes(NOTIFICATION_WINDOW_MINUTES);

    scheduled_doses(medicines)
        .into_iter()
        .filter_map(|dose| {
            let (distance, date) = distance_to_slot(dose.time, now)?;
            if distance > window || taken.contains(&dose.medicine_id, dose.time, date) {
                return None;
            }
            let view = NotificationView {
                id: dose.notification_id(),
                dose,
            };
            Some((view, date))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify;
    use chrono::TimeZone;
    use medminder_api::{DoseStatus, Frequency, LogEntry};
    use medminder_util::{MedicineId, TimeOfDay};

    fn at_on(day: u32, hh: u32, mm: u32) -> DateTime<Local> {
        let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
        Local
            .from_local_datetime(&date.and_hms_opt(hh, mm, 0).unwrap())
            .single()
            .unwrap()
    }

    fn at(hh: u32, mm: u32) -> DateTime<Local> {
        at_on(15, hh, mm)
    }

    fn medicine(id: &str, times: &[&str]) -> Medicine {
        Medicine {
            id: MedicineId::new(id),
            name: id.to_uppercase(),
            dosage: "10mg".into(),
            frequency: match times.len() {
                1 => Frequency::OnceDaily,
                2 => Frequency::TwiceDaily,
                3 => Frequency::ThreeTimesDaily,
                _ => Frequency::FourTimesDaily,
            },
            times: times.iter().map(|t| t.parse().unwrap()).collect(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: None,
            notes: None,
            color: None,
        }
    }

    fn nid(id: &str, time: &str) -> NotificationId {
        NotificationId::new(MedicineId::new(id), time.parse::<TimeOfDay>().unwrap())
    }

    fn ids(notifications: &[NotificationView]) -> Vec<String> {
        notifications.iter().map(|n| n.id.to_string()).collect()
    }

    #[test]
    fn window_is_five_minutes() {
        let med = medicine("m1", &["08:00", "20:00"]);
        let taken = TakenSet::new();

        assert!(NotificationTracker::compute_due([&med], &at(7, 54), &taken).is_empty());
        assert_eq!(ids(&NotificationTracker::compute_due([&med], &at(7, 55), &taken)), vec!["m1-08:00"]);
        assert_eq!(ids(&NotificationTracker::compute_due([&med], &at(8, 5), &taken)), vec!["m1-08:00"]);
        assert!(NotificationTracker::compute_due([&med], &at(8, 6), &taken).is_empty());
    }

    #[test]
    fn alarm_plays_once_per_notification() {
        let med = medicine("m1", &["08:00"]);
        let taken = TakenSet::new();
        let mut tracker = NotificationTracker::new();

        let first = tracker.evaluate([&med], &at(8, 0), &taken, true);
        assert_eq!(ids(&first.triggered), vec!["m1-08:00"]);
        assert!(first.play_alarm);
        assert!(tracker.has_played(&nid("m1", "08:00"), &at(8, 0)));

        let second = tracker.evaluate([&med], &at(8, 1), &taken, true);
        assert!(second.triggered.is_empty());
        assert!(!second.play_alarm);
        assert_eq!(tracker.due().len(), 1);
    }

    #[test]
    fn sound_disabled_defers_alarm() {
        let med = medicine("m1", &["08:00"]);
        let taken = TakenSet::new();
        let mut tracker = NotificationTracker::new();

        let quiet = tracker.evaluate([&med], &at(8, 0), &taken, false);
        assert_eq!(quiet.triggered.len(), 1);
        assert!(!quiet.play_alarm);
        assert!(!tracker.has_played(&nid("m1", "08:00"), &at(8, 0)));

        let enabled = tracker.evaluate([&med], &at(8, 1), &taken, true);
        assert!(enabled.play_alarm);
    }

    #[test]
    fn one_alarm_for_several_new_doses() {
        let a = medicine("a", &["08:00"]);
        let b = medicine("b", &["08:02"]);
        let mut tracker = NotificationTracker::new();

        let evaluation = tracker.evaluate([&a, &b], &at(8, 0), &TakenSet::new(), true);
        assert_eq!(evaluation.triggered.len(), 2);
        assert!(evaluation.play_alarm);
        assert!(tracker.has_played(&nid("a", "08:00"), &at(8, 0)));
        assert!(tracker.has_played(&nid("b", "08:02"), &at(8, 0)));
    }

    #[test]
    fn dismissed_does_not_refire() {
        let med = medicine("m1", &["08:00"]);
        let taken = TakenSet::new();
        let mut tracker = NotificationTracker::new();

        tracker.evaluate([&med], &at(8, 0), &taken, true);
        assert!(tracker.dismiss(nid("m1", "08:00"), &at(8, 0)));
        assert!(!tracker.dismiss(nid("m1", "08:00"), &at(8, 1)));

        let after = tracker.evaluate([&med], &at(8, 1), &taken, true);
        assert_eq!(after.retired, vec![(nid("m1", "08:00"), RetireReason::Dismissed)]);
        assert!(tracker.due().is_empty());

        let later = tracker.evaluate([&med], &at(8, 3), &taken, true);
        assert!(later.triggered.is_empty());
        assert!(later.retired.is_empty());
    }

    #[test]
    fn taken_retires_with_reason() {
        let med = medicine("m1", &["08:00"]);
        let mut taken = TakenSet::new();
        let mut tracker = NotificationTracker::new();

        tracker.evaluate([&med], &at(8, 0), &taken, true);

        taken.insert(&LogEntry {
            medicine_id: MedicineId::new("m1"),
            medicine_name: "M1".into(),
            time: "08:00".parse().unwrap(),
            taken_at: "08:01".parse().unwrap(),
            date: at(8, 1).date_naive(),
        });
        let after = tracker.evaluate([&med], &at(8, 1), &taken, true);
        assert_eq!(after.retired, vec![(nid("m1", "08:00"), RetireReason::Taken)]);
    }

    #[test]
    fn window_exit_retires() {
        let med = medicine("m1", &["08:00"]);
        let mut tracker = NotificationTracker::new();

        tracker.evaluate([&med], &at(8, 0), &TakenSet::new(), true);
        let after = tracker.evaluate([&med], &at(8, 6), &TakenSet::new(), true);
        assert_eq!(after.retired, vec![(nid("m1", "08:00"), RetireReason::NoLongerDue)]);
    }

    #[test]
    fn removed_medicine_retires() {
        let med = medicine("m1", &["08:00"]);
        let mut tracker = NotificationTracker::new();

        tracker.evaluate([&med], &at(8, 0), &TakenSet::new(), true);
        let after = tracker.evaluate(std::iter::empty(), &at(8, 1), &TakenSet::new(), true);
        assert_eq!(after.retired, vec![(nid("m1", "08:00"), RetireReason::NoLongerDue)]);
    }

    #[test]
    fn day_rollover_resets_session_state() {
        let med = medicine("m1", &["08:00"]);
        let taken = TakenSet::new();
        let mut tracker = NotificationTracker::new();

        tracker.evaluate([&med], &at(8, 0), &taken, true);
        tracker.dismiss(nid("m1", "08:00"), &at(8, 0));
        tracker.evaluate([&med], &at(8, 1), &taken, true);

        let next_day = tracker.evaluate([&med], &at_on(16, 8, 0), &taken, true);
        assert_eq!(next_day.rolled_over, Some(at_on(16, 8, 0).date_naive()));
        assert_eq!(ids(&next_day.triggered), vec!["m1-08:00"]);
        assert!(next_day.play_alarm);
        assert!(tracker.is_dismissed(&nid("m1", "08:00"), &at(8, 1)));
        assert!(!tracker.is_dismissed(&nid("m1", "08:00"), &at_on(16, 8, 0)));
    }

    #[test]
    fn dismissal_survives_midnight() {
        let med = medicine("m1", &["23:58"]);
        let taken = TakenSet::new();
        let mut tracker = NotificationTracker::new();

        let late = tracker.evaluate([&med], &at(23, 58), &taken, true);
        assert!(late.play_alarm);
        assert!(tracker.dismiss(nid("m1", "23:58"), &at(23, 58)));

        let after = tracker.evaluate([&med], &at_on(16, 0, 1), &taken, true);
        assert_eq!(after.rolled_over, Some(at_on(16, 0, 1).date_naive()));
        assert_eq!(after.retired, vec![(nid("m1", "23:58"), RetireReason::Dismissed)]);
        assert!(after.triggered.is_empty());
        assert!(!after.play_alarm);
        assert!(tracker.due().is_empty());
    }

    #[test]
    fn alarm_once_per_instance_across_midnight() {
        let med = medicine("m1", &["23:58"]);
        let taken = TakenSet::new();
        let mut tracker = NotificationTracker::new();

        assert!(tracker.evaluate([&med], &at(23, 58), &taken, true).play_alarm);

        let after = tracker.evaluate([&med], &at_on(16, 0, 1), &taken, true);
        assert!(after.triggered.is_empty());
        assert!(!after.play_alarm);
        assert_eq!(tracker.due().len(), 1);

        // The next night's dose is a new instance
        tracker.evaluate([&med], &at_on(16, 0, 5), &taken, true);
        let next_night = tracker.evaluate([&med], &at_on(16, 23, 58), &taken, true);
        assert_eq!(ids(&next_night.triggered), vec!["m1-23:58"]);
        assert!(next_night.play_alarm);
    }

    #[test]
    fn due_set_is_subset_of_due_or_overdue() {
        let meds = [
            medicine("a", &["08:00", "12:00", "18:00"]),
            medicine("b", &["00:02", "23:58"]),
            medicine("c", &["08:04"]),
        ];
        let taken = TakenSet::new();

        for (day, hh, mm) in [(15, 8, 0), (15, 8, 3), (15, 23, 59), (16, 0, 1), (15, 12, 5)] {
            let now = at_on(day, hh, mm);
            for n in NotificationTracker::compute_due(&meds, &now, &taken) {
                let status = classify(n.id.medicine_id(), n.id.time(), &now, &taken);
                assert!(
                    matches!(status, DoseStatus::DueNow | DoseStatus::Overdue),
                    "{} at {} was {:?}",
                    n.id,
                    now,
                    status
                );
            }
        }
    }
}
