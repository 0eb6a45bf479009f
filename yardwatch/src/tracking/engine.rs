//! The tracking engine: ingestion, staleness sweep, misplaced flagging.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::alerts::AlertChannel;
use crate::detection::{DetectionSource, RawDetection, Sensor, SensorStatus};
use crate::model::{Alert, EntityStatus, TrackedEntity};
use crate::store::EntityStore;
use crate::telemetry::TrackingMetrics;
use crate::zone::YardLayout;

use super::anomaly::{MisplacedPicker, RandomPicker};
use super::config::TrackingConfig;
use super::error::TrackingError;
use super::report::{AlertReport, CycleReport, IngestReport};

/// Model recorded when a new entity's detection carries none.
const UNKNOWN_MODEL: &str = "unknown";

/// Writes that failed and are retried at the start of the next cycle.
#[derive(Debug, Default)]
struct PendingWrites {
    /// Latest unpersisted version of each entity.
    entities: HashMap<String, TrackedEntity>,
    /// Unpersisted alerts, oldest first.
    alerts: Vec<Alert>,
}

impl PendingWrites {
    fn len(&self) -> usize {
        self.entities.len() + self.alerts.len()
    }
}

/// Owns the active entity set and drives every state change.
///
/// All mutation happens through `ingest_cycle`, `sweep_staleness`,
/// `maybe_flag_misplaced` and `run_cycle`. The active set is guarded by a
/// single mutex that is never held across store I/O.
pub struct TrackingEngine {
    layout: YardLayout,
    store: Arc<dyn EntityStore>,
    alerts: Arc<AlertChannel>,
    source: Arc<dyn DetectionSource>,
    sensors: RwLock<Vec<Sensor>>,
    active: Mutex<HashMap<String, TrackedEntity>>,
    pending: Mutex<PendingWrites>,
    picker: Arc<dyn MisplacedPicker>,
    metrics: Arc<TrackingMetrics>,
    config: TrackingConfig,
}

impl std::fmt::Debug for TrackingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingEngine")
            .field("store", &self.store.name())
            .field("source", &self.source.name())
            .field("active", &self.active.lock().len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TrackingEngine {
    /// Create an engine over the default yard layout and sensor roster.
    pub fn new(
        store: Arc<dyn EntityStore>,
        alerts: Arc<AlertChannel>,
        source: Arc<dyn DetectionSource>,
        config: TrackingConfig,
    ) -> Self {
        Self {
            layout: YardLayout::default(),
            store,
            alerts,
            source,
            sensors: RwLock::new(Sensor::default_roster()),
            active: Mutex::new(HashMap::new()),
            pending: Mutex::new(PendingWrites::default()),
            picker: Arc::new(RandomPicker::new(config.seed)),
            metrics: Arc::new(TrackingMetrics::new()),
            config,
        }
    }

    pub fn with_layout(mut self, layout: YardLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_sensors(mut self, sensors: Vec<Sensor>) -> Self {
        self.sensors = RwLock::new(sensors);
        self
    }

    /// Replace the misplaced-entity picker.
    pub fn with_picker(mut self, picker: Arc<dyn MisplacedPicker>) -> Self {
        self.picker = picker;
        self
    }

    /// Record into shared metrics instead of the engine's own.
    pub fn with_metrics(mut self, metrics: Arc<TrackingMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn layout(&self) -> &YardLayout {
        &self.layout
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub fn alerts(&self) -> &Arc<AlertChannel> {
        &self.alerts
    }

    pub fn metrics(&self) -> &Arc<TrackingMetrics> {
        &self.metrics
    }

    /// Snapshot of the sensor roster.
    pub fn sensors(&self) -> Vec<Sensor> {
        self.sensors.read().clone()
    }

    /// Change a sensor's operational status. Takes effect next cycle.
    pub fn set_sensor_status(&self, sensor_id: &str, status: SensorStatus) -> Result<(), TrackingError> {
        let mut sensors = self.sensors.write();
        let sensor = sensors
            .iter_mut()
            .find(|s| s.id == sensor_id)
            .ok_or_else(|| TrackingError::UnknownSensor(sensor_id.to_string()))?;
        if sensor.status != status {
            tracing::info!(sensor = %sensor_id, from = %sensor.status, to = %status, "Sensor status changed");
            sensor.status = status;
        }
        Ok(())
    }

    /// Number of entities in the active set.
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Snapshot of the active set, ordered by id.
    pub fn active_entities(&self) -> Vec<TrackedEntity> {
        let mut entities: Vec<_> = self.active.lock().values().cloned().collect();
        entities.sort_by(|a, b| a.id.cmp(&b.id));
        entities
    }

    /// Number of writes waiting to be retried.
    pub fn pending_writes(&self) -> usize {
        self.pending.lock().len()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Ingest one sensor's batch.
    ///
    /// Each valid detection is clamped into the yard, classified, merged
    /// into the active set and upserted to the store. Malformed detections
    /// are skipped without affecting the rest of the batch. Confidence is
    /// recorded as given.
    pub fn ingest_cycle(
        &self,
        sensor_id: &str,
        detections: &[RawDetection],
        now: DateTime<Utc>,
    ) -> IngestReport {
        let mut report = IngestReport::default();
        let mut produced = Vec::with_capacity(detections.len());

        {
            let mut active = self.active.lock();
            for raw in detections {
                let valid = match raw.validate() {
                    Ok(valid) => valid,
                    Err(e) => {
                        self.metrics.malformed_skipped();
                        tracing::debug!(sensor = %sensor_id, error = %e, "Skipping malformed detection");
                        report.errors.push(TrackingError::Malformed {
                            sensor: sensor_id.to_string(),
                            source: e,
                        });
                        continue;
                    }
                };

                let (position, zone) = self.layout.locate(valid.position);
                let entity = match active.get(&valid.proposed_id) {
                    Some(existing) => TrackedEntity {
                        id: existing.id.clone(),
                        label: valid.label.unwrap_or_else(|| existing.label.clone()),
                        model: valid.model.unwrap_or_else(|| existing.model.clone()),
                        position,
                        zone,
                        status: EntityStatus::Active,
                        last_seen: now,
                        source_sensor_id: sensor_id.to_string(),
                        confidence: valid.confidence,
                    },
                    None => {
                        tracing::debug!(entity = %valid.proposed_id, zone = %zone, sensor = %sensor_id, "New entity");
                        TrackedEntity {
                            label: valid.label.unwrap_or_else(|| valid.proposed_id.clone()),
                            model: valid.model.unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
                            id: valid.proposed_id,
                            position,
                            zone,
                            status: EntityStatus::Active,
                            last_seen: now,
                            source_sensor_id: sensor_id.to_string(),
                            confidence: valid.confidence,
                        }
                    }
                };
                active.insert(entity.id.clone(), entity.clone());
                produced.push(entity);
            }
        }

        self.metrics.detections_ingested(produced.len() as u64);
        for entity in produced {
            if let Err(e) = self.persist_entity(&entity) {
                report.errors.push(e);
            }
            report.entities.push(entity);
        }
        report
    }

    /// Remove every active entity unseen for longer than `threshold` and
    /// raise a `missing` alert for each.
    ///
    /// An entity exactly at the threshold is kept.
    pub fn sweep_staleness(&self, now: DateTime<Utc>, threshold: Duration) -> AlertReport {
        let mut expired: Vec<TrackedEntity> = {
            let mut active = self.active.lock();
            let stale_ids: Vec<String> = active
                .values()
                .filter(|e| is_stale(e, now, threshold))
                .map(|e| e.id.clone())
                .collect();
            stale_ids.iter().filter_map(|id| active.remove(id)).collect()
        };
        expired.sort_by(|a, b| a.id.cmp(&b.id));

        let mut report = AlertReport::default();
        for entity in expired {
            tracing::info!(
                entity = %entity.id,
                zone = %entity.zone,
                last_seen = %entity.last_seen,
                "Entity missing"
            );
            self.metrics.missing_alert_raised();
            self.raise(Alert::missing(&entity, threshold, now), &mut report);
        }
        report
    }

    /// With the given probability, raise a `misplaced` alert for one active
    /// entity picked uniformly. The entity stays active.
    ///
    /// Does nothing when the active set is empty.
    pub fn maybe_flag_misplaced(&self, now: DateTime<Utc>, probability: f64) -> AlertReport {
        let target = {
            let active = self.active.lock();
            if active.is_empty() {
                return AlertReport::default();
            }
            let mut ids: Vec<&String> = active.keys().collect();
            ids.sort();
            self.picker
                .pick(probability, ids.len())
                .and_then(|idx| ids.get(idx).and_then(|id| active.get(*id)))
                .cloned()
        };

        let mut report = AlertReport::default();
        if let Some(entity) = target {
            tracing::info!(entity = %entity.id, zone = %entity.zone, "Entity flagged as misplaced");
            self.metrics.misplaced_alert_raised();
            self.raise(Alert::misplaced(&entity, now), &mut report);
        }
        report
    }

    /// Run one full cycle at `now`.
    ///
    /// Retries queued writes, ingests every online sensor, then sweeps and
    /// flags. Never fails as a whole; per-item failures land in the report.
    pub fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::default();

        let (retried, retry_errors) = self.flush_pending();
        report.writes_retried = retried;
        report.errors.extend(retry_errors);

        for sensor in self.sensors() {
            if !sensor.is_operational() {
                self.metrics.sensor_skipped_offline();
                report.sensors_skipped += 1;
                tracing::trace!(sensor = %sensor.id, "Sensor offline, skipping");
                continue;
            }
            report.sensors_polled += 1;

            match self.source.detect(&sensor) {
                Ok(batch) => report.absorb_ingest(self.ingest_cycle(&sensor.id, &batch, now)),
                Err(e) => {
                    self.metrics.source_failed();
                    tracing::warn!(sensor = %sensor.id, error = %e, "Detection source failed");
                    report.errors.push(e.into());
                }
            }
        }

        report.absorb_alerts(self.sweep_staleness(now, self.config.staleness_threshold));
        report.absorb_alerts(self.maybe_flag_misplaced(now, self.config.misplaced_probability));

        self.metrics.cycle_completed();
        if !report.is_clean() {
            self.metrics.cycle_had_errors();
        }
        tracing::debug!(
            polled = report.sensors_polled,
            skipped = report.sensors_skipped,
            entities = report.entities.len(),
            alerts = report.alerts.len(),
            errors = report.errors.len(),
            active = self.active_count(),
            "Cycle complete"
        );
        report
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn persist_entity(&self, entity: &TrackedEntity) -> Result<(), TrackingError> {
        match self.store.upsert_entity(entity) {
            Ok(()) => {
                // a newer successful write supersedes any queued one
                self.pending.lock().entities.remove(&entity.id);
                Ok(())
            }
            Err(e) => {
                self.metrics.storage_failed();
                tracing::warn!(entity = %entity.id, error = %e, "Entity write failed, queued for retry");
                self.pending
                    .lock()
                    .entities
                    .insert(entity.id.clone(), entity.clone());
                Err(TrackingError::Storage {
                    record: format!("entity {}", entity.id),
                    source: e,
                })
            }
        }
    }

    /// Persist and publish an alert. Publication happens even if the write
    /// failed; the write is queued for retry.
    fn raise(&self, alert: Alert, report: &mut AlertReport) {
        if let Err(e) = self.store.append_alert(&alert) {
            self.metrics.storage_failed();
            tracing::warn!(alert = %alert.id, error = %e, "Alert write failed, queued for retry");
            self.pending.lock().alerts.push(alert.clone());
            report.errors.push(TrackingError::Storage {
                record: format!("alert {}", alert.id),
                source: e,
            });
        }
        self.alerts.publish(alert.clone());
        report.alerts.push(alert);
    }

    /// Retry queued writes. Returns how many succeeded and the failures,
    /// which stay queued.
    fn flush_pending(&self) -> (usize, Vec<TrackingError>) {
        let (entities, alerts) = {
            let mut pending = self.pending.lock();
            if pending.entities.is_empty() && pending.alerts.is_empty() {
                return (0, Vec::new());
            }
            (
                std::mem::take(&mut pending.entities),
                std::mem::take(&mut pending.alerts),
            )
        };

        let mut retried = 0;
        let mut errors = Vec::new();

        for (id, entity) in entities {
            match self.store.upsert_entity(&entity) {
                Ok(()) => {
                    retried += 1;
                    self.metrics.write_retried();
                }
                Err(e) => {
                    self.metrics.storage_failed();
                    self.pending.lock().entities.entry(id.clone()).or_insert(entity);
                    errors.push(TrackingError::Storage {
                        record: format!("entity {}", id),
                        source: e,
                    });
                }
            }
        }

        let mut still_pending = Vec::new();
        for alert in alerts {
            match self.store.append_alert(&alert) {
                Ok(()) => {
                    retried += 1;
                    self.metrics.write_retried();
                }
                Err(e) => {
                    self.metrics.storage_failed();
                    errors.push(TrackingError::Storage {
                        record: format!("alert {}", alert.id),
                        source: e,
                    });
                    still_pending.push(alert);
                }
            }
        }
        if !still_pending.is_empty() {
            let mut pending = self.pending.lock();
            still_pending.append(&mut pending.alerts);
            pending.alerts = still_pending;
        }

        if retried > 0 {
            tracing::info!(retried, remaining = self.pending_writes(), "Retried queued writes");
        }
        (retried, errors)
    }
}

/// Strictly older than the threshold. Entities seen "in the future" relative
/// to `now` are never stale.
fn is_stale(entity: &TrackedEntity, now: DateTime<Utc>, threshold: Duration) -> bool {
    entity
        .age(now)
        .to_std()
        .map(|age| age > threshold)
        .unwrap_or(false)
}
