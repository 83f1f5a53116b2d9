//! Validated configuration structures

use crate::schema::{RawConfig, RawMedicine, RawServiceConfig};
use medminder_api::{Frequency, NewMedicine};
use medminder_util::{default_data_dir, default_socket_path, parse_date};
use std::path::PathBuf;
use std::time::Duration;

/// Default notification poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Validated configuration ready for use by the service
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub service: ServiceSettings,

    /// Imported only when the store holds no medicines
    pub seed_medicines: Vec<NewMedicine>,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceSettings::from_raw(raw.service),
            seed_medicines: raw.medicines.into_iter().filter_map(convert_medicine).collect(),
        }
    }
}

/// Service settings
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
    pub sound_enabled: bool,
    pub respect_date_range: bool,
    pub haptics_enabled: bool,
}

impl ServiceSettings {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            socket_path: raw.socket_path.unwrap_or_else(default_socket_path),
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            poll_interval: raw
                .poll_interval_seconds
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            sound_enabled: raw.sound_enabled.unwrap_or(true),
            respect_date_range: raw.respect_date_range.unwrap_or(false),
            haptics_enabled: raw.haptics_enabled.unwrap_or(true),
        }
    }

    /// SQLite database file inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("medminder.db")
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_raw(RawServiceConfig::default())
    }
}

// Validation has already rejected anything that would fail here
fn convert_medicine(raw: RawMedicine) -> Option<NewMedicine> {
    let frequency: Frequency = raw.frequency.parse().ok()?;
    Some(NewMedicine {
        name: raw.name,
        dosage: raw.dosage,
        frequency,
        times: raw.times,
        start_date: raw.start_date.as_deref().and_then(|d| parse_date(d).ok()),
        end_date: raw.end_date.as_deref().and_then(|d| parse_date(d).ok()),
        notes: raw.notes,
        color: raw.color,
    })
}
