//! Shared data model for the medminder API

use chrono::NaiveDate;
use medminder_util::{MedicineId, NotificationId, TimeOfDay};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How often a medicine is taken each day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    OnceDaily,
    TwiceDaily,
    ThreeTimesDaily,
    FourTimesDaily,
    AsNeeded,
}

impl Frequency {
    /// Number of scheduled daily dose slots
    pub fn slot_count(self) -> usize {
        match self {
            Self::OnceDaily => 1,
            Self::TwiceDaily => 2,
            Self::ThreeTimesDaily => 3,
            Self::FourTimesDaily => 4,
            Self::AsNeeded => 0,
        }
    }

    /// As-needed medicines have no slots and never take part in
    /// time-driven projections.
    pub fn is_time_driven(self) -> bool {
        !matches!(self, Self::AsNeeded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnceDaily => "once_daily",
            Self::TwiceDaily => "twice_daily",
            Self::ThreeTimesDaily => "three_times_daily",
            Self::FourTimesDaily => "four_times_daily",
            Self::AsNeeded => "as_needed",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::OnceDaily => "Once daily",
            Self::TwiceDaily => "Twice daily",
            Self::ThreeTimesDaily => "Three times daily",
            Self::FourTimesDaily => "Four times daily",
            Self::AsNeeded => "As needed",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "once_daily" | "daily" | "1x" => Ok(Self::OnceDaily),
            "twice_daily" | "2x" => Ok(Self::TwiceDaily),
            "three_times_daily" | "3x" => Ok(Self::ThreeTimesDaily),
            "four_times_daily" | "4x" => Ok(Self::FourTimesDaily),
            "as_needed" | "prn" => Ok(Self::AsNeeded),
            other => Err(format!("unknown frequency: {}", other)),
        }
    }
}

/// A registered medicine.
///
/// Medicines are never edited in place: a change is a delete followed by a
/// fresh add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: MedicineId,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    /// Daily slot times, as entered. Empty for as-needed medicines.
    #[serde(default)]
    pub times: Vec<TimeOfDay>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl Medicine {
    /// Whether `date` falls within `start_date..=end_date`
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.is_none_or(|end| date <= end)
    }
}

/// Request payload for registering a medicine.
///
/// Times are carried as raw strings so validation can report exactly which
/// entry is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedicine {
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub times: Vec<String>,
    /// Defaults to the day the medicine is added
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// One scheduled slot of one medicine on the current calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseInstance {
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub dosage: String,
    pub time: TimeOfDay,
}

impl DoseInstance {
    pub fn new(medicine: &Medicine, time: TimeOfDay) -> Self {
        Self {
            medicine_id: medicine.id.clone(),
            medicine_name: medicine.name.clone(),
            dosage: medicine.dosage.clone(),
            time,
        }
    }

    pub fn notification_id(&self) -> NotificationId {
        NotificationId::new(self.medicine_id.clone(), self.time)
    }
}

/// A dose still ahead today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingDose {
    pub medicine: Medicine,
    pub time: TimeOfDay,
    /// Always at least 1
    pub minutes_until: u16,
}

/// Classification of a dose instance at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseStatus {
    Future,
    DueNow,
    Overdue,
    Taken,
}

impl DoseStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Future => "Upcoming",
            Self::DueNow => "Due Now",
            Self::Overdue => "Overdue",
            Self::Taken => "Taken",
        }
    }
}

/// A dose instance with its current classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseView {
    pub dose: DoseInstance,
    pub status: DoseStatus,
}

/// Append-only record of a taken dose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub medicine_id: MedicineId,
    /// Denormalized so the log still reads after the medicine is deleted
    pub medicine_name: String,
    /// Scheduled slot the dose belongs to
    pub time: TimeOfDay,
    /// Wall-clock time the dose was marked taken
    pub taken_at: TimeOfDay,
    pub date: NaiveDate,
}

/// A live reminder shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: NotificationId,
    pub dose: DoseInstance,
}

/// Why a notification left the due set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetireReason {
    Taken,
    Dismissed,
    /// No longer within the trigger window, or its medicine was removed
    NoLongerDue,
}

/// Service state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStateSnapshot {
    pub api_version: u32,
    pub today: NaiveDate,
    pub medicine_count: usize,
    pub sound_enabled: bool,
    pub notifications: Vec<NotificationView>,
    pub doses_today: Vec<DoseView>,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub ready: bool,
    pub store_healthy: bool,
    pub audio_available: bool,
}
