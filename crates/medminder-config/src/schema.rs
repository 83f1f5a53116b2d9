//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global service settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Medicines imported when the store is empty
    #[serde(default)]
    pub medicines: Vec<RawMedicine>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path
    pub socket_path: Option<PathBuf>,

    /// Data directory for store
    pub data_dir: Option<PathBuf>,

    /// Notification poll interval (default: 60)
    pub poll_interval_seconds: Option<u64>,

    /// Play the alarm automatically when a dose becomes due (default: true)
    pub sound_enabled: Option<bool>,

    /// Skip medicines outside their start/end dates (default: false)
    pub respect_date_range: Option<bool>,

    /// Vibrate on due and taken doses when supported (default: true)
    pub haptics_enabled: Option<bool>,
}

/// Raw seed medicine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMedicine {
    pub name: String,

    pub dosage: String,

    /// e.g. "once_daily", "twice_daily", "as_needed"
    pub frequency: String,

    /// Slot times (HH:MM), one per daily dose
    #[serde(default)]
    pub times: Vec<String>,

    /// YYYY-MM-DD
    pub start_date: Option<String>,

    /// YYYY-MM-DD
    pub end_date: Option<String>,

    pub notes: Option<String>,

    pub color: Option<String>,
}
