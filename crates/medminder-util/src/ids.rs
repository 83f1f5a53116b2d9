//! Strongly-typed identifiers for medminder

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{MedminderError, TimeOfDay};

/// Unique identifier for a registered medicine
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedicineId(String);

impl MedicineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id for a newly added medicine
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MedicineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MedicineId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MedicineId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a notification: one scheduled slot of one medicine.
///
/// Rendered as `{medicine_id}-{HH:MM}`. Medicine ids may themselves contain
/// dashes, so parsing splits on the last dash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct NotificationId {
    medicine_id: MedicineId,
    time: TimeOfDay,
}

impl NotificationId {
    pub fn new(medicine_id: MedicineId, time: TimeOfDay) -> Self {
        Self { medicine_id, time }
    }

    pub fn medicine_id(&self) -> &MedicineId {
        &self.medicine_id
    }

    pub fn time(&self) -> TimeOfDay {
        self.time
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.medicine_id, self.time)
    }
}

impl FromStr for NotificationId {
    type Err = MedminderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (medicine, time) = s
            .rsplit_once('-')
            .ok_or_else(|| MedminderError::InvalidNotificationId(s.to_string()))?;
        if medicine.is_empty() {
            return Err(MedminderError::InvalidNotificationId(s.to_string()));
        }
        let time = time
            .parse::<TimeOfDay>()
            .map_err(|_| MedminderError::InvalidNotificationId(s.to_string()))?;
        Ok(Self::new(MedicineId::new(medicine), time))
    }
}

impl From<NotificationId> for String {
    fn from(id: NotificationId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for NotificationId {
    type Error = MedminderError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Unique identifier for a connected IPC client
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medicine_id_equality() {
        let id1 = MedicineId::new("aspirin");
        let id2 = MedicineId::new("aspirin");
        let id3 = MedicineId::new("ibuprofen");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn generated_medicine_ids_are_unique() {
        assert_ne!(MedicineId::generate(), MedicineId::generate());
    }

    #[test]
    fn notification_id_format() {
        let id = NotificationId::new(MedicineId::new("m1"), TimeOfDay::new(8, 0).unwrap());
        assert_eq!(id.to_string(), "m1-08:00");
    }

    #[test]
    fn notification_id_parses_uuid_medicine() {
        let medicine = MedicineId::generate();
        let id = NotificationId::new(medicine.clone(), TimeOfDay::new(20, 30).unwrap());
        let parsed: NotificationId = id.to_string().parse().unwrap();

        assert_eq!(parsed.medicine_id(), &medicine);
        assert_eq!(parsed.time(), TimeOfDay::new(20, 30).unwrap());
    }

    #[test]
    fn notification_id_rejects_garbage() {
        assert!("no-dash-time".parse::<NotificationId>().is_err());
        assert!("-08:00".parse::<NotificationId>().is_err());
        assert!("m1-25:00".parse::<NotificationId>().is_err());
    }

    #[test]
    fn ids_serialize_as_strings() {
        let id = NotificationId::new(MedicineId::new("m1"), TimeOfDay::new(7, 5).unwrap());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"m1-07:05\"");

        let parsed: NotificationId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);

        let medicine: MedicineId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(medicine.as_str(), "abc");
    }
}
