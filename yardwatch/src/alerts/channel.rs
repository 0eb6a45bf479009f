//! Unbounded FIFO alert queue.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::model::Alert;

/// Unbounded, thread-safe alert queue.
///
/// `publish` never blocks beyond the brief queue lock. Alerts are removed
/// when taken, so with several consumers each alert reaches only one.
#[derive(Debug, Default)]
pub struct AlertChannel {
    queue: Mutex<VecDeque<Alert>>,
    available: Condvar,
}

impl AlertChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an alert and wake one waiting consumer.
    pub fn publish(&self, alert: Alert) {
        self.queue.lock().push_back(alert);
        self.available.notify_one();
    }

    /// Remove and return everything currently queued, oldest first.
    pub fn drain_available(&self) -> Vec<Alert> {
        self.queue.lock().drain(..).collect()
    }

    /// Block until an alert is available and return it.
    pub fn take(&self) -> Alert {
        let mut queue = self.queue.lock();
        loop {
            if let Some(alert) = queue.pop_front() {
                return alert;
            }
            self.available.wait(&mut queue);
        }
    }

    /// Like [`take`](Self::take) but gives up after `timeout`.
    pub fn take_timeout(&self, timeout: Duration) -> Option<Alert> {
        let mut queue = self.queue.lock();
        if let Some(alert) = queue.pop_front() {
            return Some(alert);
        }
        let deadline = std::time::Instant::now() + timeout;
        loop {
            if self.available.wait_until(&mut queue, deadline).timed_out() {
                return queue.pop_front();
            }
            if let Some(alert) = queue.pop_front() {
                return Some(alert);
            }
        }
    }

    /// Number of alerts waiting to be taken.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AlertKind;
    use chrono::Utc;
    use std::sync::Arc;
    use std::thread;

    fn alert(entity: &str) -> Alert {
        Alert::new(AlertKind::Missing, entity, "test", Utc::now())
    }

    #[test]
    fn test_drain_preserves_order() {
        let channel = AlertChannel::new();
        channel.publish(alert("A"));
        channel.publish(alert("B"));
        channel.publish(alert("C"));
        assert_eq!(channel.len(), 3);

        let drained: Vec<_> = channel
            .drain_available()
            .into_iter()
            .map(|a| a.entity_id)
            .collect();
        assert_eq!(drained, vec!["A", "B", "C"]);
        assert!(channel.is_empty());
        assert!(channel.drain_available().is_empty());
    }

    #[test]
    fn test_take_blocks_until_published() {
        let channel = Arc::new(AlertChannel::new());
        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.take().entity_id)
        };

        thread::sleep(Duration::from_millis(20));
        channel.publish(alert("X1"));
        assert_eq!(consumer.join().unwrap(), "X1");
    }

    #[test]
    fn test_take_timeout_expires_on_empty_queue() {
        let channel = AlertChannel::new();
        assert!(channel.take_timeout(Duration::from_millis(10)).is_none());
        channel.publish(alert("X1"));
        assert_eq!(
            channel.take_timeout(Duration::from_millis(10)).unwrap().entity_id,
            "X1"
        );
    }

    #[test]
    fn test_each_alert_delivered_once_across_consumers() {
        let channel = Arc::new(AlertChannel::new());
        for i in 0..100 {
            channel.publish(alert(&format!("E{}", i)));
        }

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let channel = Arc::clone(&channel);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(a) = channel.take_timeout(Duration::from_millis(10)) {
                        seen.push(a.id);
                    }
                    seen
                })
            })
            .collect();

        let mut all: Vec<_> = consumers
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(total, 100);
        assert_eq!(all.len(), 100);
    }
}
