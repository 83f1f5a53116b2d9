//! Typed access to the named JSON records

use medminder_api::{LogEntry, Medicine};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{AuditEvent, AuditEventType, Store, StoreResult};

/// Record holding the medicine list
pub const MEDICINES_RECORD: &str = "medicines";

/// Record holding the adherence log
pub const LOG_RECORD: &str = "medicine_log";

/// Load a JSON array record.
///
/// Unreadable or malformed data is logged, audited as `StorageRecovered`
/// and treated as an empty list. This never fails.
pub fn load_list<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Vec<T> {
    let raw = match store.load_record(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(record = key, "No stored record");
            return Vec::new();
        }
        Err(e) => {
            recover(store, key, e.to_string());
            return Vec::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            recover(store, key, e.to_string());
            Vec::new()
        }
    }
}

/// Replace a JSON array record
pub fn save_list<T: Serialize>(store: &dyn Store, key: &str, items: &[T]) -> StoreResult<()> {
    let json = serde_json::to_string(items)?;
    store.save_record(key, &json)?;
    debug!(record = key, count = items.len(), "Record saved");
    Ok(())
}

/// Load the medicine list, dropping entries whose slot count does not
/// match their frequency.
pub fn load_medicines(store: &dyn Store) -> Vec<Medicine> {
    let mut medicines: Vec<Medicine> = load_list(store, MEDICINES_RECORD);
    medicines.retain(|medicine| {
        let expected = medicine.frequency.slot_count();
        if medicine.times.len() == expected {
            return true;
        }
        recover(
            store,
            MEDICINES_RECORD,
            format!(
                "medicine {} has {} times, {:?} needs {}",
                medicine.id,
                medicine.times.len(),
                medicine.frequency,
                expected
            ),
        );
        false
    });
    medicines
}

pub fn save_medicines(store: &dyn Store, medicines: &[Medicine]) -> StoreResult<()> {
    save_list(store, MEDICINES_RECORD, medicines)
}

pub fn load_log(store: &dyn Store) -> Vec<LogEntry> {
    load_list(store, LOG_RECORD)
}

pub fn save_log(store: &dyn Store, entries: &[LogEntry]) -> StoreResult<()> {
    save_list(store, LOG_RECORD, entries)
}

fn recover(store: &dyn Store, key: &str, error: String) {
    warn!(record = key, error = %error, "Stored record unreadable, skipping");
    let event = AuditEvent::new(AuditEventType::StorageRecovered {
        record: key.to_string(),
        error,
    });
    if let Err(e) = store.append_audit(event) {
        warn!(error = %e, "Failed to audit storage recovery");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteStore;
    use chrono::NaiveDate;
    use medminder_api::Frequency;
    use medminder_util::MedicineId;

    fn medicine() -> Medicine {
        Medicine {
            id: MedicineId::new("m1"),
            name: "Lisinopril".into(),
            dosage: "10mg".into(),
            frequency: Frequency::OnceDaily,
            times: vec!["09:00".parse().unwrap()],
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: None,
            notes: Some("with water".into()),
            color: None,
        }
    }

    #[test]
    fn missing_record_is_empty() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(load_medicines(&store).is_empty());
        assert!(load_log(&store).is_empty());
        assert!(store.get_recent_audits(10).unwrap().is_empty());
    }

    #[test]
    fn medicines_persist() {
        let store = SqliteStore::in_memory().unwrap();
        save_medicines(&store, &[medicine()]).unwrap();

        let loaded = load_medicines(&store);
        assert_eq!(loaded, vec![medicine()]);
    }

    #[test]
    fn malformed_record_recovers_empty() {
        let store = SqliteStore::in_memory().unwrap();
        store.save_record(MEDICINES_RECORD, "{not json").unwrap();

        assert!(load_medicines(&store).is_empty());

        let audits = store.get_recent_audits(10).unwrap();
        assert_eq!(audits.len(), 1);
        match &audits[0].event {
            AuditEventType::StorageRecovered { record, .. } => {
                assert_eq!(record, MEDICINES_RECORD);
            }
            other => panic!("unexpected audit event: {:?}", other),
        }
    }

    #[test]
    fn inconsistent_medicine_is_skipped() {
        let store = SqliteStore::in_memory().unwrap();
        let broken = Medicine {
            id: MedicineId::new("m2"),
            frequency: Frequency::TwiceDaily,
            ..medicine()
        };
        save_medicines(&store, &[medicine(), broken]).unwrap();

        assert_eq!(load_medicines(&store), vec![medicine()]);

        let audits = store.get_recent_audits(10).unwrap();
        assert_eq!(audits.len(), 1);
        match &audits[0].event {
            AuditEventType::StorageRecovered { record, error } => {
                assert_eq!(record, MEDICINES_RECORD);
                assert!(error.contains("m2"), "{error}");
            }
            other => panic!("unexpected audit event: {:?}", other),
        }
    }

    #[test]
    fn wrong_shape_recovers_empty() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .save_record(LOG_RECORD, r#"[{"medicine_id": 42}]"#)
            .unwrap();

        assert!(load_log(&store).is_empty());
    }
}
