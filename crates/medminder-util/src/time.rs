//! Time utilities for medminder
//!
//! Provides the service clock (wall-clock, mockable in debug builds) and the
//! `TimeOfDay` value used for daily dose slots.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `MEDMINDER_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is useful
//! for exercising due and overdue windows without waiting for them.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 07:58:00`)
//!
//! Example:
//! ```bash
//! MEDMINDER_MOCK_TIME="2025-12-25 07:58:00" medminderd
//! ```

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::MedminderError;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "MEDMINDER_MOCK_TIME";

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    Ok(naive_dt) => {
                        if let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() {
                            let offset = mock_dt.signed_duration_since(chrono::Local::now());
                            tracing::info!(
                                mock_time = %mock_time_str,
                                offset_secs = offset.num_seconds(),
                                "Mock time enabled"
                            );
                            return Some(offset);
                        }
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            "Failed to convert mock time to local timezone"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = "%Y-%m-%d %H:%M:%S",
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, MedminderError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| MedminderError::InvalidDate(s.to_string()))
}

/// A wall-clock time of day with minute precision (`HH:MM`, 24-hour).
///
/// Serialized as the `HH:MM` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    /// Minutes since midnight (`hour * 60 + minute`)
    pub fn minute_of_day(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    /// Truncates seconds.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    pub fn of(dt: &DateTime<Local>) -> Self {
        Self::from_naive_time(dt.time())
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// This time of day on the given calendar date in the local timezone.
    ///
    /// Returns `None` when the local time does not exist on that date
    /// (skipped by a DST transition). Ambiguous times resolve to the earlier
    /// instant.
    pub fn on(self, date: NaiveDate) -> Option<DateTime<Local>> {
        Local
            .from_local_datetime(&date.and_time(self.to_naive_time()))
            .earliest()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = MedminderError;

    /// Parse `HH:MM` with `0 <= HH <= 23` and `0 <= MM <= 59`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| MedminderError::time_of_day(s, "expected HH:MM format"))?;

        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(hour) || hour.len() != 2 {
            return Err(MedminderError::time_of_day(s, "invalid hour"));
        }
        if !all_digits(minute) || minute.len() != 2 {
            return Err(MedminderError::time_of_day(s, "invalid minute"));
        }

        let hour: u8 = hour
            .parse()
            .map_err(|_| MedminderError::time_of_day(s, "invalid hour"))?;
        let minute: u8 = minute
            .parse()
            .map_err(|_| MedminderError::time_of_day(s, "invalid minute"))?;

        if hour >= 24 {
            return Err(MedminderError::time_of_day(s, "hour must be 0-23"));
        }
        if minute >= 60 {
            return Err(MedminderError::time_of_day(s, "minute must be 0-59"));
        }

        Ok(Self { hour, minute })
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = MedminderError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_time_of_day_ordering() {
        let morning = TimeOfDay::new(8, 0).unwrap();
        let noon = TimeOfDay::new(12, 0).unwrap();
        let evening = TimeOfDay::new(18, 30).unwrap();

        assert!(morning < noon);
        assert!(noon < evening);
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!("14:30".parse::<TimeOfDay>().unwrap(), TimeOfDay::new(14, 30).unwrap());
        assert_eq!("00:00".parse::<TimeOfDay>().unwrap(), TimeOfDay::new(0, 0).unwrap());
        assert_eq!("23:59".parse::<TimeOfDay>().unwrap(), TimeOfDay::new(23, 59).unwrap());
        assert_eq!("08:05".parse::<TimeOfDay>().unwrap(), TimeOfDay::new(8, 5).unwrap());

        for bad in [
            "24:00", "12:60", "invalid", "", "12:5", "8:05", "008:05", "+1:00", "12:00:00", "1200",
            "-1:30",
        ] {
            assert!(bad.parse::<TimeOfDay>().is_err(), "expected '{}' to be rejected", bad);
        }
    }

    #[test]
    fn test_time_of_day_serializes_as_string() {
        let t = TimeOfDay::new(7, 5).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"07:05\"");
        assert!(serde_json::from_str::<TimeOfDay>("\"25:00\"").is_err());
    }

    #[test]
    fn test_time_of_day_on_date() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let dt = TimeOfDay::new(8, 0).unwrap().on(date).unwrap();
        assert_eq!(dt.date_naive(), date);
        assert_eq!(TimeOfDay::of(&dt), TimeOfDay::new(8, 0).unwrap());
    }

    #[test]
    fn test_dates() {
        let date = parse_date("2025-12-25").unwrap();
        assert_eq!(date.day(), 25);
        assert!(parse_date("2025/12/25").is_err());
        assert!(parse_date("2025-13-01").is_err());
    }

    #[test]
    fn test_now_returns_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }

    #[test]
    fn test_mock_time_env_var_name() {
        assert_eq!(MOCK_TIME_ENV_VAR, "MEDMINDER_MOCK_TIME");
        let example = "2025-12-25 07:58:00";
        assert!(NaiveDateTime::parse_from_str(example, "%Y-%m-%d %H:%M:%S").is_ok());
    }
}
