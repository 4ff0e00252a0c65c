//! Integration tests for wardend
//!
//! These tests verify the end-to-end behavior of the service: a real
//! on-disk store, the full engine, and the timing scenarios a deployed
//! instance actually sees.

use std::sync::Arc;

use warden_api::{AlertKind, Phase, TimerRecord};
use warden_config::{parse_config, TimerPolicy};
use warden_core::{CoreEvent, TickOutcome, TimerEngine};
use warden_store::{SqliteStore, Store};
use warden_util::{EpochMillis, HouseId, ManualClock};

const SEC: EpochMillis = 1_000;

fn open_engine(dir: &tempfile::TempDir, policy: TimerPolicy) -> TimerEngine {
    let store: Arc<dyn Store> =
        Arc::new(SqliteStore::open(dir.path().join("wardend.db")).unwrap());
    TimerEngine::new(policy, store)
}

fn alerts(events: &[CoreEvent]) -> Vec<AlertKind> {
    events
        .iter()
        .filter_map(|event| match event {
            CoreEvent::Alert { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect()
}

/// Drive the engine once per second between two instants, collecting
/// every event, the way the service loop does.
fn run_seconds(engine: &mut TimerEngine, from_s: i64, to_s: i64) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    for s in from_s..=to_s {
        for token in engine.active_tokens() {
            if let TickOutcome::Evaluated {
                events: mut house_events,
                ..
            } = engine.tick(token, s * SEC)
            {
                events.append(&mut house_events);
            }
        }
    }
    events
}

#[test]
fn second_by_second_run_fires_each_alert_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut policy = TimerPolicy::default();
    policy.initial_duration_seconds = 30;
    let mut engine = open_engine(&dir, policy);

    engine.start(HouseId::new(0, 12).unwrap(), 0).unwrap();
    let events = run_seconds(&mut engine, 1, 45);

    let kinds = alerts(&events);
    assert_eq!(
        kinds,
        vec![
            AlertKind::Preview,
            AlertKind::ZeroCrossing,
            AlertKind::Overtime { offset_seconds: 5 },
            AlertKind::Overtime { offset_seconds: 10 },
        ]
    );
}

#[test]
fn state_survives_a_service_restart() {
    let dir = tempfile::tempdir().unwrap();
    let house = HouseId::new(2, 12).unwrap();

    {
        let mut engine = open_engine(&dir, TimerPolicy::default());
        let (token, _) = engine.start(house, 0).unwrap();
        engine.tick(token, 40 * SEC);
    } // service stops here

    // New process over the same database, 60s later
    let mut engine = open_engine(&dir, TimerPolicy::default());
    engine.restore_all(100 * SEC);

    let timer = engine.house(house).unwrap();
    assert_eq!(timer.phase, Phase::Running);
    assert_eq!(timer.displayed_remaining, 2000);
    assert_eq!(timer.started_at, Some(0));
}

#[test]
fn restart_across_expiry_voices_one_crossing() {
    let dir = tempfile::tempdir().unwrap();
    let house = HouseId::new(0, 12).unwrap();
    let mut policy = TimerPolicy::default();
    policy.initial_duration_seconds = 60;

    {
        let mut engine = open_engine(&dir, policy.clone());
        let (token, _) = engine.start(house, 0).unwrap();
        engine.tick(token, 10 * SEC);
    }

    // Down across the preview and the expiry
    let mut engine = open_engine(&dir, policy);
    let events = engine.restore_all(90 * SEC);

    assert_eq!(alerts(&events), vec![AlertKind::ZeroCrossing]);
    assert_eq!(engine.house(house).unwrap().phase, Phase::Overtime);
    // Overtime measured from the restore, so neither offset has fired
    let next = run_seconds(&mut engine, 91, 94);
    assert!(alerts(&next).is_empty());
}

#[test]
fn manual_clock_drives_a_deterministic_session() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(1_700_000_000_000);
    let mut policy = TimerPolicy::default();
    policy.initial_duration_seconds = 120;
    let mut engine = open_engine(&dir, policy);

    use warden_util::Clock;
    let house = HouseId::new(7, 12).unwrap();
    let (token, _) = engine.start(house, clock.now_ms().unwrap()).unwrap();

    clock.advance_secs(115);
    match engine.tick(token, clock.now_ms().unwrap()) {
        TickOutcome::Evaluated {
            remaining_seconds,
            events,
        } => {
            assert_eq!(remaining_seconds, 5);
            assert_eq!(alerts(&events), vec![AlertKind::Preview]);
        }
        TickOutcome::Stale => panic!("live tick reported stale"),
    }

    clock.advance_secs(6);
    match engine.tick(token, clock.now_ms().unwrap()) {
        TickOutcome::Evaluated {
            remaining_seconds,
            events,
        } => {
            assert_eq!(remaining_seconds, 0);
            assert_eq!(alerts(&events), vec![AlertKind::ZeroCrossing]);
        }
        TickOutcome::Stale => panic!("live tick reported stale"),
    }
}

#[test]
fn configured_policy_changes_thresholds() {
    let toml = r#"
        config_version = 1

        [timers]
        total_houses = 4
        initial_duration_seconds = 300
        preview_alert_seconds = 30
        overtime_alert_offsets = [15, 30, 60]
    "#;
    let policy = parse_config(toml).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut engine = open_engine(&dir, policy);
    let house = HouseId::new(3, 4).unwrap();
    let (token, _) = engine.start(house, 0).unwrap();

    match engine.tick(token, 270 * SEC) {
        TickOutcome::Evaluated { events, .. } => {
            assert_eq!(alerts(&events), vec![AlertKind::Preview]);
        }
        TickOutcome::Stale => panic!("live tick reported stale"),
    }

    engine.tick(token, 301 * SEC); // crossing
    match engine.tick(token, (301 + 15) * SEC) {
        TickOutcome::Evaluated { events, .. } => {
            assert_eq!(
                alerts(&events),
                vec![AlertKind::Overtime { offset_seconds: 15 }]
            );
        }
        TickOutcome::Stale => panic!("live tick reported stale"),
    }
}

#[test]
fn export_import_moves_state_between_instances() {
    let source_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();
    let house = HouseId::new(1, 12).unwrap();

    let mut source = open_engine(&source_dir, TimerPolicy::default());
    let (token, _) = source.start(house, 0).unwrap();
    source.tick(token, 30 * SEC);
    let exported = source.export_all(30 * SEC);

    let mut target = open_engine(&target_dir, TimerPolicy::default());
    let applied = target.import_all(&exported, 30 * SEC).unwrap();
    assert_eq!(applied, 12);

    let timer = target.house(house).unwrap();
    assert_eq!(timer.phase, Phase::Running);
    assert_eq!(timer.displayed_remaining, 2070);

    // The imported anchor keeps counting from original start time
    let tokens = target.active_tokens();
    assert_eq!(tokens.len(), 1);
    match target.tick(tokens[0], 100 * SEC) {
        TickOutcome::Evaluated {
            remaining_seconds, ..
        } => assert_eq!(remaining_seconds, 2000),
        TickOutcome::Stale => panic!("live tick reported stale"),
    }
}

#[test]
fn bad_row_only_affects_its_own_house() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("wardend.db");
    let good = HouseId::new(0, 12).unwrap();
    let bad = HouseId::new(1, 12).unwrap();

    {
        let store = SqliteStore::open(&db_path).unwrap();
        store
            .save(
                good,
                &TimerRecord {
                    duration: 2100,
                    extended: false,
                    negative: false,
                    running: true,
                    start_time: Some(0),
                    total_duration: 2100,
                },
            )
            .unwrap();
        // Active overtime with no anchor cannot be resumed; the loader
        // must discard it without touching its neighbors.
        store
            .save(
                bad,
                &TimerRecord {
                    duration: -5,
                    extended: true,
                    negative: true,
                    running: true,
                    start_time: None,
                    total_duration: 0,
                },
            )
            .unwrap();
    }

    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&db_path).unwrap());
    let mut engine = TimerEngine::new(TimerPolicy::default(), store);
    engine.restore_all(10 * SEC);

    assert_eq!(engine.house(good).unwrap().phase, Phase::Running);
    assert_eq!(engine.house(good).unwrap().displayed_remaining, 2090);
    assert_eq!(engine.house(bad).unwrap().phase, Phase::Idle);
}
