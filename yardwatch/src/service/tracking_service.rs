//! The running service and its consumer API.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::alerts::AlertChannel;
use crate::detection::{DetectionSource, Sensor, SensorStatus};
use crate::model::{Alert, TrackedEntity};
use crate::store::{EntityStore, MemoryEntityStore, SqliteEntityStore};
use crate::telemetry::TelemetrySnapshot;
use crate::tracking::TrackingEngine;

use super::config::ServiceConfig;
use super::error::ServiceError;
use super::scheduler::TrackingScheduler;

/// A started tracking engine plus its background scheduler.
///
/// Dropping the service cancels the scheduler without waiting for it; call
/// [`shutdown`](Self::shutdown) to stop it cleanly.
pub struct TrackingService {
    engine: Arc<TrackingEngine>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for TrackingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingService")
            .field("engine", &self.engine)
            .field("running", &self.is_running())
            .finish()
    }
}

impl TrackingService {
    /// Open the configured store and start tracking.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: ServiceConfig,
        source: Arc<dyn DetectionSource>,
    ) -> Result<Self, ServiceError> {
        let store: Arc<dyn EntityStore> = match &config.database {
            Some(path) => Arc::new(SqliteEntityStore::open(path)?),
            None => Arc::new(MemoryEntityStore::new()),
        };
        Self::start_with_store(config, store, source)
    }

    /// Start tracking against an already opened store.
    pub fn start_with_store(
        config: ServiceConfig,
        store: Arc<dyn EntityStore>,
        source: Arc<dyn DetectionSource>,
    ) -> Result<Self, ServiceError> {
        let engine = TrackingEngine::new(store, Arc::new(AlertChannel::new()), source, config.tracking)
            .with_layout(config.layout)
            .with_sensors(config.sensors);
        Self::from_engine(engine)
    }

    /// Start the scheduler for a fully built engine.
    pub fn from_engine(engine: TrackingEngine) -> Result<Self, ServiceError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ServiceError::NoRuntime)?;
        let engine = Arc::new(engine);
        let shutdown = CancellationToken::new();

        tracing::info!(
            store = engine.store().name(),
            sensors = engine.sensors().len(),
            zones = engine.layout().zones().len(),
            staleness_secs = engine.config().staleness_threshold.as_secs(),
            "Tracking service starting"
        );

        let scheduler = TrackingScheduler::new(Arc::clone(&engine));
        let task = runtime.spawn(scheduler.run(shutdown.clone()));

        Ok(Self {
            engine,
            shutdown,
            task: Mutex::new(Some(task)),
        })
    }

    /// Stop the scheduler, letting an in-progress cycle finish.
    ///
    /// Idempotent.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.shutdown.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            task.await
                .map_err(|e| ServiceError::TaskFailed(e.to_string()))?;
            tracing::info!(
                active = self.engine.active_count(),
                pending_writes = self.engine.pending_writes(),
                "Tracking service stopped"
            );
        }
        Ok(())
    }

    /// Whether the scheduler is still running.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// The engine, for direct cycles in tests and tools.
    pub fn engine(&self) -> &Arc<TrackingEngine> {
        &self.engine
    }

    // =========================================================================
    // Consumer API
    // =========================================================================

    /// Every stored entity, most recently seen first.
    pub fn list_entities(&self) -> Result<Vec<TrackedEntity>, ServiceError> {
        Ok(self.engine.store().list_entities()?)
    }

    /// Every stored alert, most recent first.
    pub fn list_alerts(&self) -> Result<Vec<Alert>, ServiceError> {
        Ok(self.engine.store().list_alerts()?)
    }

    /// Mark an alert resolved.
    pub fn resolve_alert(&self, id: Uuid) -> Result<(), ServiceError> {
        self.engine.store().resolve_alert(id)?;
        tracing::info!(alert = %id, "Alert resolved");
        Ok(())
    }

    /// Take every alert published since the last drain.
    pub fn drain_alerts(&self) -> Vec<Alert> {
        self.engine.alerts().drain_available()
    }

    /// Shared handle to the alert channel, for blocking consumers.
    pub fn alert_channel(&self) -> Arc<AlertChannel> {
        Arc::clone(self.engine.alerts())
    }

    /// Alerts published but not yet taken.
    pub fn alert_queue_depth(&self) -> usize {
        self.engine.alerts().len()
    }

    /// Entities currently considered present.
    pub fn active_entity_count(&self) -> usize {
        self.engine.active_count()
    }

    /// Sensor roster with operational status.
    pub fn sensors(&self) -> Vec<Sensor> {
        self.engine.sensors()
    }

    /// Take a sensor offline or bring it back.
    pub fn set_sensor_status(&self, sensor_id: &str, status: SensorStatus) -> Result<(), ServiceError> {
        Ok(self.engine.set_sensor_status(sensor_id, status)?)
    }

    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.engine
            .metrics()
            .snapshot()
            .with_gauges(self.active_entity_count(), self.alert_queue_depth())
    }
}

impl Drop for TrackingService {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{RawDetection, ScriptedDetectionSource};
    use crate::tracking::TrackingConfig;

    #[test]
    fn test_start_outside_runtime_fails() {
        let result = TrackingService::start(
            ServiceConfig::default(),
            Arc::new(ScriptedDetectionSource::new()),
        );
        assert!(matches!(result, Err(ServiceError::NoRuntime)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_is_idempotent() {
        let config = ServiceConfig::builder()
            .tracking(TrackingConfig::default().with_interval(std::time::Duration::from_millis(10)))
            .build();
        let service =
            TrackingService::start(config, Arc::new(ScriptedDetectionSource::new())).unwrap();
        assert!(service.is_running());

        service.shutdown().await.unwrap();
        assert!(!service.is_running());
        service.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_consumer_api_reflects_cycles() {
        let source = Arc::new(ScriptedDetectionSource::new());
        source.push_batch("CAM1", vec![RawDetection::new("X1", 25.0, 20.0, 0.9)]);
        let config = ServiceConfig::builder()
            .tracking(
                TrackingConfig::default()
                    .with_interval(std::time::Duration::from_millis(10))
                    .with_misplaced_probability(0.0),
            )
            .build();
        let service = TrackingService::start(config, source).unwrap();

        for _ in 0..200 {
            if service.active_entity_count() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        service.shutdown().await.unwrap();

        assert_eq!(service.active_entity_count(), 1);
        assert_eq!(service.list_entities().unwrap()[0].id, "X1");
        assert_eq!(service.alert_queue_depth(), 0);
        let snapshot = service.telemetry_snapshot();
        assert!(snapshot.cycles >= 1);
        assert_eq!(snapshot.active_entities, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sensor_status_via_service() {
        let service = TrackingService::start(
            ServiceConfig::default(),
            Arc::new(ScriptedDetectionSource::new()),
        )
        .unwrap();
        service.set_sensor_status("CAM2", SensorStatus::Offline).unwrap();
        let cam2 = service
            .sensors()
            .into_iter()
            .find(|s| s.id == "CAM2")
            .unwrap();
        assert_eq!(cam2.status, SensorStatus::Offline);
        assert!(matches!(
            service.set_sensor_status("NOPE", SensorStatus::Online),
            Err(ServiceError::Tracking(_))
        ));
        service.shutdown().await.unwrap();
    }
}
