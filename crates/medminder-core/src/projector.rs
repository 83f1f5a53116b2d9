//! Dose projector: doses still ahead today

use chrono::{DateTime, Local};
use medminder_api::{Medicine, UpcomingDose};
use medminder_util::TimeOfDay;

use crate::sorted_slots;

/// Every slot later today than `now`, soonest first.
///
/// `minutes_until` is always at least 1. Ties keep medicine order. Doses
/// earlier today are not wrapped to tomorrow.
pub fn upcoming_doses<'a>(
    medicines: impl IntoIterator<Item = &'a Medicine>,
    now: &DateTime<Local>,
) -> Vec<UpcomingDose> {
    let now_minute = TimeOfDay::of(now).minute_of_day();

    let mut upcoming: Vec<UpcomingDose> = medicines
        .into_iter()
        .flat_map(|medicine| {
            sorted_slots(medicine)
                .into_iter()
                .filter(move |slot| slot.minute_of_day() > now_minute)
                .map(move |slot| UpcomingDose {
                    medicine: medicine.clone(),
                    time: slot,
                    minutes_until: slot.minute_of_day() - now_minute,
                })
        })
        .collect();

    // sort_by_key is stable
    upcoming.sort_by_key(|d| d.minutes_until);
    upcoming
}
