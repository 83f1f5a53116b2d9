//! Configuration validation

use crate::schema::{RawConfig, RawMedicine};
use chrono::NaiveDate;
use medminder_api::Frequency;
use medminder_util::{parse_date, TimeOfDay};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Medicine #{index} ('{name}'): {message}")]
    MedicineError {
        index: usize,
        name: String,
        message: String,
    },

    #[error("Invalid time format '{value}': {message}")]
    InvalidTimeFormat { value: String, message: String },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.service.poll_interval_seconds == Some(0) {
        errors.push(ValidationError::GlobalError(
            "poll_interval_seconds must be greater than 0".into(),
        ));
    }

    for (index, medicine) in config.medicines.iter().enumerate() {
        errors.extend(validate_medicine(index + 1, medicine));
    }

    errors
}

fn validate_medicine(index: usize, medicine: &RawMedicine) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let error = |message: String| ValidationError::MedicineError {
        index,
        name: medicine.name.clone(),
        message,
    };

    if medicine.name.trim().is_empty() {
        errors.push(error("name cannot be empty".into()));
    }
    if medicine.dosage.trim().is_empty() {
        errors.push(error("dosage cannot be empty".into()));
    }

    match medicine.frequency.parse::<Frequency>() {
        Ok(frequency) => {
            if medicine.times.len() != frequency.slot_count() {
                errors.push(error(format!(
                    "{} needs {} time(s), got {}",
                    frequency,
                    frequency.slot_count(),
                    medicine.times.len()
                )));
            }
        }
        Err(e) => errors.push(error(e)),
    }

    for time in &medicine.times {
        if let Err(e) = time.parse::<TimeOfDay>() {
            errors.push(ValidationError::InvalidTimeFormat {
                value: time.clone(),
                message: e.to_string(),
            });
        }
    }

    let start = date_field(&medicine.start_date, &mut errors);
    let end = date_field(&medicine.end_date, &mut errors);
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        errors.push(error(format!(
            "end_date {} is before start_date {}",
            end, start
        )));
    }

    errors
}

fn date_field(value: &Option<String>, errors: &mut Vec<ValidationError>) -> Option<NaiveDate> {
    let value = value.as_ref()?;
    match parse_date(value) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(ValidationError::InvalidDate(value.clone()));
            None
        }
    }
}
