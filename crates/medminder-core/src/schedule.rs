//! Schedule model: daily dose slots of a medicine

use chrono::NaiveDate;
use medminder_api::{DoseInstance, Medicine, NewMedicine};
use medminder_util::{MedicineId, TimeOfDay};

use crate::{CoreError, CoreResult};

/// Daily slot times as minutes since midnight, ascending.
///
/// As-needed medicines have no slots.
pub fn slot_minutes(medicine: &Medicine) -> Vec<u16> {
    sorted_slots(medicine)
        .into_iter()
        .map(TimeOfDay::minute_of_day)
        .collect()
}

/// Daily slot times, ascending
pub fn sorted_slots(medicine: &Medicine) -> Vec<TimeOfDay> {
    if !medicine.frequency.is_time_driven() {
        return Vec::new();
    }
    let mut slots = medicine.times.clone();
    slots.sort();
    slots
}

/// Dose instances of every scheduled medicine, ordered by slot time.
/// Ties keep medicine order.
pub fn scheduled_doses<'a>(medicines: impl IntoIterator<Item = &'a Medicine>) -> Vec<DoseInstance> {
    let mut doses: Vec<DoseInstance> = medicines
        .into_iter()
        .flat_map(|m| sorted_slots(m).into_iter().map(move |t| DoseInstance::new(m, t)))
        .collect();
    doses.sort_by_key(|d| d.time);
    doses
}

/// Whether `time` is one of the medicine's daily slots
pub fn has_slot(medicine: &Medicine, time: TimeOfDay) -> bool {
    medicine.frequency.is_time_driven() && medicine.times.contains(&time)
}

/// Validate a new medicine and assign it a fresh id.
///
/// `today` is used when no start date is given.
pub fn validate_new_medicine(new: NewMedicine, today: NaiveDate) -> CoreResult<Medicine> {
    build_medicine(MedicineId::generate(), new, today)
}

/// Validate a new medicine under a caller-chosen id
pub fn build_medicine(id: MedicineId, new: NewMedicine, today: NaiveDate) -> CoreResult<Medicine> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidMedicine("name is required".into()));
    }
    let dosage = new.dosage.trim();
    if dosage.is_empty() {
        return Err(CoreError::InvalidMedicine("dosage is required".into()));
    }

    let expected = new.frequency.slot_count();
    if new.times.len() != expected {
        return Err(CoreError::InvalidSchedule(format!(
            "{} needs {} time(s), got {}",
            new.frequency,
            expected,
            new.times.len()
        )));
    }

    let times = new
        .times
        .iter()
        .map(|t| {
            t.trim()
                .parse::<TimeOfDay>()
                .map_err(|e| CoreError::InvalidSchedule(e.to_string()))
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let start_date = new.start_date.unwrap_or(today);
    if let Some(end) = new.end_date
        && end < start_date
    {
        return Err(CoreError::InvalidSchedule(format!(
            "end date {} is before start date {}",
            end, start_date
        )));
    }

    Ok(Medicine {
        id,
        name: name.to_string(),
        dosage: dosage.to_string(),
        frequency: new.frequency,
        times,
        start_date,
        end_date: new.end_date,
        notes: new.notes.filter(|n| !n.trim().is_empty()),
        color: new.color,
    })
}
