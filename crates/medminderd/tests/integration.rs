//! Integration tests for medminderd
//!
//! These tests drive the engine the way the service loop does: a real
//! on-disk store, ticks at chosen times, and alerts dispatched to a mock
//! audio output.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use medminder_api::{DoseStatus, Frequency, NewMedicine, RetireReason};
use medminder_config::parse_config;
use medminder_core::{CoreEngine, CoreEvent, EngineOptions};
use medminder_host_api::{AlertPlayer, AlertSound, AudioHandle, MockAudio, TonePattern};
use medminder_store::{AuditEventType, SqliteStore, Store};
use medminder_util::{NotificationId, TimeOfDay};
use std::sync::Arc;

fn at(day: u32, hh: u32, mm: u32) -> DateTime<Local> {
    let date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
    Local
        .from_local_datetime(&date.and_hms_opt(hh, mm, 0).unwrap())
        .single()
        .unwrap()
}

fn t(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

fn twice_daily() -> NewMedicine {
    NewMedicine {
        name: "Metformin".into(),
        dosage: "500mg".into(),
        frequency: Frequency::TwiceDaily,
        times: vec!["08:00".into(), "20:00".into()],
        start_date: None,
        end_date: None,
        notes: None,
        color: None,
    }
}

/// Dispatch alert events the way the service does and wait for playback
async fn dispatch(alerts: &AlertPlayer, events: &[CoreEvent]) {
    for event in events {
        if let CoreEvent::AlertRequested { sound, .. } = event {
            alerts.play(*sound).await.unwrap();
        }
    }
}

fn triggered(events: &[CoreEvent]) -> Vec<NotificationId> {
    events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::NotificationTriggered { notification } => Some(notification.id.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_twice_daily_day() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let mut engine = CoreEngine::new(store, EngineOptions::default());
    let med = engine.add_medicine(twice_daily(), &at(1, 6, 0)).unwrap();

    // 07:00: both doses ahead
    let upcoming = engine.upcoming(&at(1, 7, 0), None);
    let pairs: Vec<_> = upcoming
        .iter()
        .map(|u| (u.time.to_string(), u.minutes_until))
        .collect();
    assert_eq!(pairs, vec![("08:00".to_string(), 60), ("20:00".to_string(), 780)]);

    // 08:03: morning dose due, evening dose ahead
    let doses = engine.today_doses(&at(1, 8, 3));
    assert_eq!(doses[0].status, DoseStatus::DueNow);
    assert_eq!(doses[1].status, DoseStatus::Future);

    // 08:20: morning dose missed its window
    let doses = engine.today_doses(&at(1, 8, 20));
    assert_eq!(doses[0].status, DoseStatus::Overdue);

    // Taken at 08:05, it stays taken for the rest of the day
    engine.record_taken(&med.id, t("08:00"), &at(1, 8, 5)).unwrap();
    for (hh, mm) in [(8, 5), (8, 20), (12, 0), (23, 59)] {
        let doses = engine.today_doses(&at(1, hh, mm));
        assert_eq!(doses[0].status, DoseStatus::Taken, "at {hh:02}:{mm:02}");
    }
}

#[tokio::test]
async fn test_alarm_plays_once_per_dose() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let mut engine = CoreEngine::new(store, EngineOptions::default());
    engine.add_medicine(twice_daily(), &at(1, 6, 0)).unwrap();

    let audio = MockAudio::new();
    let alerts = AlertPlayer::audio_only(Arc::new(AudioHandle::from_output(Arc::new(
        audio.clone(),
    ))));
    let alarm_tones = TonePattern::alarm().segments.len();

    // Nothing due yet
    let events = engine.tick(&at(1, 7, 50));
    dispatch(&alerts, &events).await;
    assert!(triggered(&events).is_empty());
    assert_eq!(audio.tones_played(), 0);

    // Enters the window five minutes early
    let events = engine.tick(&at(1, 7, 55));
    dispatch(&alerts, &events).await;
    assert_eq!(triggered(&events).len(), 1);
    assert_eq!(audio.tones_played(), alarm_tones);

    // Later ticks inside the window stay quiet
    for mm in [56, 58, 59] {
        let events = engine.tick(&at(1, 7, mm));
        dispatch(&alerts, &events).await;
        assert!(triggered(&events).is_empty());
    }
    let events = engine.tick(&at(1, 8, 4));
    dispatch(&alerts, &events).await;
    assert_eq!(audio.tones_played(), alarm_tones);

    // Leaves the window
    let events = engine.tick(&at(1, 8, 6));
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::NotificationRetired {
            reason: RetireReason::NoLongerDue,
            ..
        }
    )));
    assert!(engine.notifications().is_empty());

    // An explicit replay always plays
    let replay = engine.replay_alert();
    dispatch(&alerts, std::slice::from_ref(&replay)).await;
    assert_eq!(audio.tones_played(), 2 * alarm_tones);
}

#[tokio::test]
async fn test_take_from_notification_flow() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let mut engine = CoreEngine::new(store.clone(), EngineOptions::default());
    let med = engine.add_medicine(twice_daily(), &at(1, 6, 0)).unwrap();

    let events = engine.tick(&at(1, 8, 0));
    let ids = triggered(&events);
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0], NotificationId::new(med.id.clone(), t("08:00")));

    // Every notification is due-now or overdue according to the classifier
    let doses = engine.today_doses(&at(1, 8, 0));
    for n in engine.notifications() {
        let view = doses.iter().find(|d| d.dose.notification_id() == n.id).unwrap();
        assert!(matches!(view.status, DoseStatus::DueNow | DoseStatus::Overdue));
    }

    let entry = engine.take_from_notification(&ids[0], &at(1, 8, 2)).unwrap();
    assert_eq!(entry.time, t("08:00"));
    assert_eq!(entry.taken_at, t("08:02"));

    let events = engine.tick(&at(1, 8, 2));
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::NotificationRetired {
            reason: RetireReason::Dismissed | RetireReason::Taken,
            ..
        }
    )));
    assert!(engine.notifications().is_empty());

    // Sound played on take comes from a different pattern
    let audio = MockAudio::new();
    let alerts = AlertPlayer::audio_only(Arc::new(AudioHandle::from_output(Arc::new(
        audio.clone(),
    ))));
    alerts.play(AlertSound::Success).await.unwrap();
    assert_eq!(audio.played_segments(), TonePattern::success().segments);

    let log = engine.log_for_date(at(1, 0, 0).date_naive());
    assert_eq!(log, vec![entry]);

    let audits = store.get_recent_audits(10).unwrap();
    assert!(audits
        .iter()
        .any(|a| matches!(a.event, AuditEventType::DoseTaken { .. })));
}

#[test]
fn test_dismissal_covers_one_dose() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let mut engine = CoreEngine::new(store, EngineOptions::default());
    let med = engine.add_medicine(twice_daily(), &at(1, 6, 0)).unwrap();
    let id = NotificationId::new(med.id.clone(), t("08:00"));

    engine.tick(&at(1, 8, 0));
    engine.dismiss_notification(&id, &at(1, 8, 0)).unwrap();
    assert!(triggered(&engine.tick(&at(1, 8, 1))).is_empty());
    assert!(engine.notifications().is_empty());

    // Dismissal records nothing
    assert!(engine.log_for_date(at(1, 0, 0).date_naive()).is_empty());

    // Next morning the same slot alerts again
    let events = engine.tick(&at(2, 7, 58));
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::DayRolledOver { .. })));
    assert_eq!(triggered(&events), vec![id]);
}

#[test]
fn test_dose_due_across_midnight() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let mut engine = CoreEngine::new(store, EngineOptions::default());
    let mut late = twice_daily();
    late.frequency = Frequency::OnceDaily;
    late.times = vec!["23:55".into()];
    let med = engine.add_medicine(late, &at(1, 12, 0)).unwrap();

    // Ten minutes after a 23:55 dose, on the following calendar day
    let doses = engine.today_doses(&at(2, 0, 5));
    assert_eq!(doses[0].status, DoseStatus::DueNow);

    // Taken before midnight, it reads as taken just after
    engine.record_taken(&med.id, t("23:55"), &at(1, 23, 56)).unwrap();
    let doses = engine.today_doses(&at(2, 0, 5));
    assert_eq!(doses[0].status, DoseStatus::Taken);

    // Once the window has passed the new day's dose is simply ahead
    let doses = engine.today_doses(&at(2, 1, 0));
    assert_eq!(doses[0].status, DoseStatus::Future);
}

#[test]
fn test_late_dose_taken_after_midnight() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let mut engine = CoreEngine::new(store, EngineOptions::default());
    let mut late = twice_daily();
    late.frequency = Frequency::OnceDaily;
    late.times = vec!["23:55".into()];
    let med = engine.add_medicine(late, &at(1, 12, 0)).unwrap();
    let id = NotificationId::new(med.id.clone(), t("23:55"));

    engine.tick(&at(1, 23, 55));
    let entry = engine.take_from_notification(&id, &at(2, 0, 2)).unwrap();
    assert_eq!(entry.date, at(1, 0, 0).date_naive());
    assert_eq!(engine.today_doses(&at(2, 0, 5))[0].status, DoseStatus::Taken);
    assert!(triggered(&engine.tick(&at(2, 0, 5))).is_empty());
    assert!(engine.notifications().is_empty());

    // The second night's dose is still owed and still alerts
    assert_eq!(engine.today_doses(&at(2, 23, 50))[0].status, DoseStatus::DueNow);
    engine.tick(&at(2, 12, 0));
    assert_eq!(triggered(&engine.tick(&at(2, 23, 52))), vec![id]);
}

#[test]
fn test_as_needed_never_scheduled() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let mut engine = CoreEngine::new(store, EngineOptions::default());
    let mut prn = twice_daily();
    prn.frequency = Frequency::AsNeeded;
    prn.times.clear();
    engine.add_medicine(prn, &at(1, 6, 0)).unwrap();

    assert_eq!(engine.medicines().len(), 1);
    assert!(engine.upcoming(&at(1, 6, 0), None).is_empty());
    assert!(engine.today_doses(&at(1, 8, 0)).is_empty());
    assert!(triggered(&engine.tick(&at(1, 8, 0))).is_empty());
}

#[test]
fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("medminder.db");

    let med_id = {
        let store = Arc::new(SqliteStore::open(&db_path).unwrap());
        let mut engine = CoreEngine::new(store, EngineOptions::default());
        let med = engine.add_medicine(twice_daily(), &at(1, 6, 0)).unwrap();
        engine.record_taken(&med.id, t("08:00"), &at(1, 8, 5)).unwrap();
        med.id
    };

    let store = Arc::new(SqliteStore::open(&db_path).unwrap());
    let mut engine = CoreEngine::new(store, EngineOptions::default());

    assert_eq!(engine.medicines().len(), 1);
    assert_eq!(engine.medicines()[0].id, med_id);
    assert_eq!(engine.today_doses(&at(1, 8, 10))[0].status, DoseStatus::Taken);

    // Session state is not persisted: the evening dose alerts after restart
    let events = engine.tick(&at(1, 20, 0));
    assert_eq!(
        triggered(&events),
        vec![NotificationId::new(med_id, t("20:00"))]
    );
}

#[test]
fn test_config_seed_medicines() {
    let config = parse_config(
        r#"
config_version = 1

[service]
poll_interval_seconds = 30
sound_enabled = false

[[medicines]]
name = "Lisinopril"
dosage = "10mg"
frequency = "once_daily"
times = ["09:00"]
"#,
    )
    .unwrap();

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let mut engine = CoreEngine::new(
        store,
        EngineOptions {
            sound_enabled: config.service.sound_enabled,
            respect_date_range: config.service.respect_date_range,
        },
    );
    let today = at(1, 0, 0).date_naive();

    assert_eq!(engine.seed(config.seed_medicines.clone(), today), 1);
    assert_eq!(engine.seed(config.seed_medicines, today), 0);

    // Due, but no alarm with sound off
    let events = engine.tick(&at(1, 9, 0));
    assert_eq!(triggered(&events).len(), 1);
    assert!(!events
        .iter()
        .any(|e| matches!(e, CoreEvent::AlertRequested { .. })));
}
