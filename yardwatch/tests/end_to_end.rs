//! End-to-end tracking scenarios against a real SQLite store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tempfile::tempdir;

use yardwatch::alerts::AlertChannel;
use yardwatch::detection::{RawDetection, ScriptedDetectionSource, Sensor};
use yardwatch::model::AlertKind;
use yardwatch::store::{EntityStore, SqliteEntityStore};
use yardwatch::tracking::{NeverFlag, TrackingConfig, TrackingEngine};
use yardwatch::zone::{YardBounds, YardLayout, Zone, ZoneId};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-03-10T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn engine_over(
    store: Arc<SqliteEntityStore>,
    source: Arc<ScriptedDetectionSource>,
) -> (TrackingEngine, Arc<AlertChannel>) {
    let channel = Arc::new(AlertChannel::new());
    let layout = YardLayout::new(
        YardBounds::new(100.0, 80.0),
        vec![Zone::new("A", 0.0, 50.0, 0.0, 40.0)],
    )
    .unwrap();
    let engine = TrackingEngine::new(
        store,
        channel.clone(),
        source,
        TrackingConfig::default().with_staleness_threshold(Duration::from_secs(120)),
    )
    .with_layout(layout)
    .with_sensors(vec![Sensor::new("CAM1", "Entrance", 25.0, 20.0)])
    .with_picker(Arc::new(NeverFlag));
    (engine, channel)
}

#[test]
fn single_detection_then_silence_raises_one_missing_alert() {
    let dir = tempdir().unwrap();
    let store = Arc::new(SqliteEntityStore::open(dir.path().join("yard.db")).unwrap());
    let source = Arc::new(ScriptedDetectionSource::new());
    source.push_batch("CAM1", vec![RawDetection::new("X1", 25.0, 20.0, 0.8)]);
    let (engine, channel) = engine_over(store.clone(), source);

    let first = engine.run_cycle(t0());
    assert!(first.is_clean());
    assert_eq!(first.entities.len(), 1);
    assert_eq!(first.entities[0].zone, ZoneId::new("A"));

    let entities = store.list_entities().unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].id, "X1");
    assert_eq!(entities[0].zone, ZoneId::new("A"));

    // one cycle per second until just past the threshold
    let mut alerts = Vec::new();
    for second in 1..=121 {
        let report = engine.run_cycle(t0() + chrono::Duration::seconds(second));
        alerts.extend(report.alerts);
        if second == 120 {
            assert!(alerts.is_empty(), "alert raised at exactly the threshold");
        }
    }

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Missing);
    assert_eq!(alerts[0].entity_id, "X1");
    assert_eq!(engine.active_count(), 0);

    let stored = store.list_alerts().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, alerts[0].id);
    assert!(!stored[0].resolved);

    let queued = channel.drain_available();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].id, alerts[0].id);

    // further cycles raise nothing new
    let later = engine.run_cycle(t0() + chrono::Duration::seconds(500));
    assert!(later.alerts.is_empty());
}

#[test]
fn unzoned_detection_is_outside() {
    let dir = tempdir().unwrap();
    let store = Arc::new(SqliteEntityStore::open(dir.path().join("yard.db")).unwrap());
    let source = Arc::new(ScriptedDetectionSource::new());
    source.push_batch("CAM1", vec![RawDetection::new("X9", 75.0, 60.0, 0.6)]);
    let (engine, _) = engine_over(store.clone(), source);

    engine.run_cycle(t0());
    assert!(store.list_entities().unwrap()[0].zone.is_outside());
}

#[test]
fn state_survives_reopen_and_alert_can_be_resolved() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("yard.db");

    let alert_id = {
        let store = Arc::new(SqliteEntityStore::open(&path).unwrap());
        let source = Arc::new(ScriptedDetectionSource::new());
        source.push_batch("CAM1", vec![RawDetection::new("X1", 10.0, 10.0, 0.7)]);
        let (engine, _) = engine_over(store, source);
        engine.run_cycle(t0());
        let report = engine.sweep_staleness(t0() + chrono::Duration::seconds(200), Duration::from_secs(120));
        report.alerts[0].id
    };

    let reopened = SqliteEntityStore::open(&path).unwrap();
    assert_eq!(reopened.list_entities().unwrap().len(), 1);
    reopened.resolve_alert(alert_id).unwrap();
    assert!(reopened.list_alerts().unwrap()[0].resolved);
}
