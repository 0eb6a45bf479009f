//! In-process entity store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use uuid::Uuid;

use super::{EntityStore, StoreError, StoreResult};
use crate::model::{Alert, TrackedEntity};

/// Entity store backed by in-memory maps.
///
/// Nothing survives the process. Can be switched unavailable to simulate a
/// storage outage.
#[derive(Debug)]
pub struct MemoryEntityStore {
    entities: RwLock<HashMap<String, TrackedEntity>>,
    alerts: RwLock<HashMap<Uuid, Alert>>,
    available: AtomicBool,
}

impl Default for MemoryEntityStore {
    fn default() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            alerts: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle availability. While unavailable every operation fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable {
                location: "memory".to_string(),
                reason: "store marked unavailable".to_string(),
            })
        }
    }
}

impl EntityStore for MemoryEntityStore {
    fn upsert_entity(&self, entity: &TrackedEntity) -> StoreResult<()> {
        self.check()?;
        self.entities
            .write()
            .insert(entity.id.clone(), entity.clone());
        Ok(())
    }

    fn list_entities(&self) -> StoreResult<Vec<TrackedEntity>> {
        self.check()?;
        let mut entities: Vec<_> = self.entities.read().values().cloned().collect();
        entities.sort_by(|a, b| b.last_seen.cmp(&a.last_seen).then_with(|| a.id.cmp(&b.id)));
        Ok(entities)
    }

    fn append_alert(&self, alert: &Alert) -> StoreResult<()> {
        self.check()?;
        self.alerts.write().insert(alert.id, alert.clone());
        Ok(())
    }

    fn list_alerts(&self) -> StoreResult<Vec<Alert>> {
        self.check()?;
        let mut alerts: Vec<_> = self.alerts.read().values().cloned().collect();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(alerts)
    }

    fn resolve_alert(&self, id: Uuid) -> StoreResult<()> {
        self.check()?;
        match self.alerts.write().get_mut(&id) {
            Some(alert) => {
                alert.resolved = true;
                Ok(())
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    fn count_entities(&self) -> StoreResult<usize> {
        self.check()?;
        Ok(self.entities.read().len())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertKind, EntityStatus};
    use crate::zone::{Position, ZoneId};
    use chrono::{Duration, Utc};

    fn entity(id: &str, seconds_ago: i64) -> TrackedEntity {
        TrackedEntity {
            id: id.to_string(),
            label: id.to_string(),
            model: "unknown".to_string(),
            position: Position::new(10.0, 10.0),
            zone: ZoneId::new("A"),
            status: EntityStatus::Active,
            last_seen: Utc::now() - Duration::seconds(seconds_ago),
            source_sensor_id: "CAM1".to_string(),
            confidence: 0.5,
        }
    }

    #[test]
    fn test_upsert_and_order() {
        let store = MemoryEntityStore::new();
        store.upsert_entity(&entity("B", 50)).unwrap();
        store.upsert_entity(&entity("A", 5)).unwrap();
        store.upsert_entity(&entity("B", 1)).unwrap();

        let ids: Vec<_> = store
            .list_entities()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(store.count_entities().unwrap(), 2);
    }

    #[test]
    fn test_resolve() {
        let store = MemoryEntityStore::new();
        let alert = Alert::new(AlertKind::Misplaced, "A", "moved", Utc::now());
        store.append_alert(&alert).unwrap();
        store.resolve_alert(alert.id).unwrap();
        assert!(store.list_alerts().unwrap()[0].resolved);
        assert!(matches!(
            store.resolve_alert(Uuid::new_v4()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_unavailable_rejects_everything() {
        let store = MemoryEntityStore::new();
        store.set_available(false);
        assert!(matches!(
            store.upsert_entity(&entity("A", 0)),
            Err(StoreError::Unavailable { .. })
        ));
        assert!(store.list_alerts().is_err());

        store.set_available(true);
        assert!(store.list_entities().unwrap().is_empty());
    }
}
