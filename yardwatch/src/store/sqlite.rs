//! SQLite-backed entity store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{EntityStore, StoreError, StoreResult};
use crate::model::{Alert, AlertKind, EntityStatus, TrackedEntity};
use crate::zone::{Position, ZoneId};

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS entities (
        id TEXT PRIMARY KEY,
        label TEXT NOT NULL,
        model TEXT NOT NULL,
        pos_x REAL NOT NULL,
        pos_y REAL NOT NULL,
        zone TEXT NOT NULL,
        status TEXT NOT NULL,
        last_seen TEXT NOT NULL,
        sensor_id TEXT NOT NULL,
        confidence REAL NOT NULL
    );
    CREATE TABLE IF NOT EXISTS alerts (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        description TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        resolved INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_entities_last_seen ON entities(last_seen);
    CREATE INDEX IF NOT EXISTS idx_alerts_timestamp ON alerts(timestamp);
";

/// Entity store on a SQLite database file.
///
/// Every operation opens its own connection and closes it when done. Writes
/// are additionally serialized in-process so concurrent upserts queue on a
/// mutex instead of spinning on SQLite's busy handler.
#[derive(Debug)]
pub struct SqliteEntityStore {
    path: PathBuf,
    write_gate: Mutex<()>,
}

impl SqliteEntityStore {
    /// Open (creating if needed) the database and ensure the schema exists.
    ///
    /// Safe to call against an existing database; prior rows are kept.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable {
                location: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let store = Self {
            path,
            write_gate: Mutex::new(()),
        };
        let conn = store.connect()?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %store.path.display(), "Entity store schema ready");
        Ok(store)
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> StoreResult<Connection> {
        let conn = Connection::open(&self.path).map_err(|e| StoreError::Unavailable {
            location: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    // fixed-width UTC so lexical order in SQL matches chronological order
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(table: &'static str, id: &str, raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            table,
            id: id.to_string(),
            reason: format!("bad timestamp '{}': {}", raw, e),
        })
}

struct EntityRow {
    id: String,
    label: String,
    model: String,
    pos_x: f64,
    pos_y: f64,
    zone: String,
    status: String,
    last_seen: String,
    sensor_id: String,
    confidence: f64,
}

impl EntityRow {
    fn into_entity(self) -> StoreResult<TrackedEntity> {
        let status: EntityStatus = self.status.parse().map_err(|reason| StoreError::Corrupt {
            table: "entities",
            id: self.id.clone(),
            reason,
        })?;
        let last_seen = parse_timestamp("entities", &self.id, &self.last_seen)?;
        Ok(TrackedEntity {
            id: self.id,
            label: self.label,
            model: self.model,
            position: Position::new(self.pos_x, self.pos_y),
            zone: ZoneId::new(self.zone),
            status,
            last_seen,
            source_sensor_id: self.sensor_id,
            confidence: self.confidence,
        })
    }
}

struct AlertRow {
    id: String,
    kind: String,
    entity_id: String,
    description: String,
    timestamp: String,
    resolved: bool,
}

impl AlertRow {
    fn into_alert(self) -> StoreResult<Alert> {
        let corrupt = |reason: String| StoreError::Corrupt {
            table: "alerts",
            id: self.id.clone(),
            reason,
        };
        let id = Uuid::parse_str(&self.id).map_err(|e| corrupt(e.to_string()))?;
        let kind: AlertKind = self.kind.parse().map_err(corrupt)?;
        let timestamp = parse_timestamp("alerts", &self.id, &self.timestamp)?;
        Ok(Alert {
            id,
            kind,
            entity_id: self.entity_id,
            description: self.description,
            timestamp,
            resolved: self.resolved,
        })
    }
}

impl EntityStore for SqliteEntityStore {
    fn upsert_entity(&self, entity: &TrackedEntity) -> StoreResult<()> {
        let _gate = self.write_gate.lock();
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO entities
             (id, label, model, pos_x, pos_y, zone, status, last_seen, sensor_id, confidence)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                entity.id,
                entity.label,
                entity.model,
                entity.position.x,
                entity.position.y,
                entity.zone.as_str(),
                entity.status.as_str(),
                format_timestamp(&entity.last_seen),
                entity.source_sensor_id,
                entity.confidence,
            ],
        )?;
        Ok(())
    }

    fn list_entities(&self) -> StoreResult<Vec<TrackedEntity>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, label, model, pos_x, pos_y, zone, status, last_seen, sensor_id, confidence
             FROM entities
             ORDER BY last_seen DESC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EntityRow {
                id: row.get(0)?,
                label: row.get(1)?,
                model: row.get(2)?,
                pos_x: row.get(3)?,
                pos_y: row.get(4)?,
                zone: row.get(5)?,
                status: row.get(6)?,
                last_seen: row.get(7)?,
                sensor_id: row.get(8)?,
                confidence: row.get(9)?,
            })
        })?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(row?.into_entity()?);
        }
        Ok(entities)
    }

    fn append_alert(&self, alert: &Alert) -> StoreResult<()> {
        let _gate = self.write_gate.lock();
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO alerts
             (id, kind, entity_id, description, timestamp, resolved)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                alert.id.to_string(),
                alert.kind.as_str(),
                alert.entity_id,
                alert.description,
                format_timestamp(&alert.timestamp),
                alert.resolved,
            ],
        )?;
        Ok(())
    }

    fn list_alerts(&self) -> StoreResult<Vec<Alert>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, kind, entity_id, description, timestamp, resolved
             FROM alerts
             ORDER BY timestamp DESC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AlertRow {
                id: row.get(0)?,
                kind: row.get(1)?,
                entity_id: row.get(2)?,
                description: row.get(3)?,
                timestamp: row.get(4)?,
                resolved: row.get(5)?,
            })
        })?;

        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row?.into_alert()?);
        }
        Ok(alerts)
    }

    fn resolve_alert(&self, id: Uuid) -> StoreResult<()> {
        let _gate = self.write_gate.lock();
        let conn = self.connect()?;
        let updated = conn.execute(
            "UPDATE alerts SET resolved = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn count_entities(&self) -> StoreResult<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

impl SqliteEntityStore {
    /// Fetch one alert by id.
    pub fn get_alert(&self, id: Uuid) -> StoreResult<Option<Alert>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT id, kind, entity_id, description, timestamp, resolved
                 FROM alerts WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok(AlertRow {
                        id: row.get(0)?,
                        kind: row.get(1)?,
                        entity_id: row.get(2)?,
                        description: row.get(3)?,
                        timestamp: row.get(4)?,
                        resolved: row.get(5)?,
                    })
                },
            )
            .optional()?;
        row.map(AlertRow::into_alert).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn entity(id: &str, seconds_ago: i64) -> TrackedEntity {
        TrackedEntity {
            id: id.to_string(),
            label: format!("ABC-{}", id),
            model: "Suzuki".to_string(),
            position: Position::new(25.0, 20.0),
            zone: ZoneId::new("A"),
            status: EntityStatus::Active,
            last_seen: Utc::now() - chrono::Duration::seconds(seconds_ago),
            source_sensor_id: "CAM1".to_string(),
            confidence: 0.75,
        }
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = SqliteEntityStore::open(dir.path().join("yard.db")).unwrap();
        let e = entity("X1", 0);

        store.upsert_entity(&e).unwrap();
        store.upsert_entity(&e).unwrap();

        let entities = store.list_entities().unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, "X1");
        assert_eq!(entities[0].position, e.position);
        assert_eq!(store.count_entities().unwrap(), 1);
    }

    #[test]
    fn test_upsert_last_write_wins() {
        let dir = tempdir().unwrap();
        let store = SqliteEntityStore::open(dir.path().join("yard.db")).unwrap();
        let mut e = entity("X1", 10);
        store.upsert_entity(&e).unwrap();

        e.position = Position::new(80.0, 70.0);
        e.zone = ZoneId::new("D");
        e.confidence = 0.9;
        store.upsert_entity(&e).unwrap();

        let stored = &store.list_entities().unwrap()[0];
        assert_eq!(stored.zone, ZoneId::new("D"));
        assert_eq!(stored.confidence, 0.9);
    }

    #[test]
    fn test_timestamps_round_trip_at_microsecond_precision() {
        let dir = tempdir().unwrap();
        let store = SqliteEntityStore::open(dir.path().join("yard.db")).unwrap();
        let e = entity("X1", 0);
        store.upsert_entity(&e).unwrap();

        let stored = &store.list_entities().unwrap()[0];
        let drift = (stored.last_seen - e.last_seen).num_microseconds().unwrap().abs();
        assert!(drift < 1, "drift {}us", drift);
    }

    #[test]
    fn test_entities_listed_most_recent_first() {
        let dir = tempdir().unwrap();
        let store = SqliteEntityStore::open(dir.path().join("yard.db")).unwrap();
        store.upsert_entity(&entity("OLD", 300)).unwrap();
        store.upsert_entity(&entity("NEW", 1)).unwrap();
        store.upsert_entity(&entity("MID", 60)).unwrap();

        let ids: Vec<_> = store
            .list_entities()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["NEW", "MID", "OLD"]);
    }

    #[test]
    fn test_reopen_keeps_existing_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("yard.db");
        {
            let store = SqliteEntityStore::open(&path).unwrap();
            store.upsert_entity(&entity("X1", 0)).unwrap();
            store
                .append_alert(&Alert::new(AlertKind::Missing, "X1", "gone", Utc::now()))
                .unwrap();
        }

        let reopened = SqliteEntityStore::open(&path).unwrap();
        assert_eq!(reopened.list_entities().unwrap().len(), 1);
        assert_eq!(reopened.list_alerts().unwrap().len(), 1);
    }

    #[test]
    fn test_alerts_ordering_and_resolution() {
        let dir = tempdir().unwrap();
        let store = SqliteEntityStore::open(dir.path().join("yard.db")).unwrap();
        let now = Utc::now();
        let older = Alert::new(
            AlertKind::Missing,
            "X1",
            "not seen",
            now - chrono::Duration::seconds(5),
        );
        let newer = Alert::new(AlertKind::Misplaced, "X2", "wrong zone", now);
        store.append_alert(&older).unwrap();
        store.append_alert(&newer).unwrap();

        let alerts = store.list_alerts().unwrap();
        assert_eq!(alerts[0].id, newer.id);
        assert_eq!(alerts[1].id, older.id);
        assert!(alerts.iter().all(|a| !a.resolved));

        store.resolve_alert(older.id).unwrap();
        assert!(store.get_alert(older.id).unwrap().unwrap().resolved);
        assert!(!store.get_alert(newer.id).unwrap().unwrap().resolved);
    }

    #[test]
    fn test_resolve_unknown_alert() {
        let dir = tempdir().unwrap();
        let store = SqliteEntityStore::open(dir.path().join("yard.db")).unwrap();
        let id = Uuid::new_v4();
        assert!(matches!(store.resolve_alert(id), Err(StoreError::NotFound(missing)) if missing == id));
        assert!(store.get_alert(id).unwrap().is_none());
    }

    #[test]
    fn test_concurrent_upserts_with_distinct_ids() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteEntityStore::open(dir.path().join("yard.db")).unwrap());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let mut e = entity(&format!("E{:02}", i), 0);
                    e.confidence = i as f64 / 16.0;
                    store.upsert_entity(&e).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let entities = store.list_entities().unwrap();
        assert_eq!(entities.len(), 16);
        for e in entities {
            let i: usize = e.id[1..].parse().unwrap();
            assert_eq!(e.confidence, i as f64 / 16.0);
            assert_eq!(e.label, format!("ABC-{}", e.id));
        }
    }

    #[test]
    fn test_unreachable_path_is_unavailable() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let result = SqliteEntityStore::open(blocker.join("yard.db"));
        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
    }
}
