//! Priority-ordered, rate-limited delivery queue.
//!
//! Bursty, unordered arrivals are serialized into a single-file delivery
//! stream. At every dequeue the item with the highest priority wins, ties
//! going to the earliest arrival. A single drain task delivers one item at a
//! time, never sooner than `min_interval` after the previous delivery, and
//! pauses `settle_interval` after each delivery.
//!
//! The drain suspends only while waiting out those two intervals. It waits
//! before taking the next item, so an item leaves the queue at the instant
//! it is delivered and stays removable until then. Queue state lives behind
//! a mutex that is never held across an await point.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

use chorus_core::config::DeliveryConfig;
use chorus_core::types::{NotificationEvent, NotificationId};

use crate::metrics::PipelineMetrics;

use super::listeners::{DeliveryListeners, DeliverySubscription};
use super::priority::Priority;

/// A pending notification with its ordering keys.
#[derive(Debug, Clone)]
struct QueuedItem {
    notification: NotificationEvent,
    priority: Priority,
    enqueued_at: Instant,
    /// Arrival counter; breaks ties between equal timestamps.
    seq: u64,
}

impl QueuedItem {
    /// Whether `self` drains before `other`.
    fn precedes(&self, other: &QueuedItem) -> bool {
        (other.priority, self.enqueued_at, self.seq) < (self.priority, other.enqueued_at, other.seq)
    }
}

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<QueuedItem>,
    processing: bool,
    last_delivered: Option<Instant>,
    next_seq: u64,
    drain_task: Option<JoinHandle<()>>,
    closed: bool,
}

/// Drain pacing.
#[derive(Debug, Clone, Copy)]
struct Pacing {
    min_interval: Duration,
    settle_interval: Duration,
    backlog_warn_threshold: usize,
}

/// Serializes notifications into a paced, priority-ordered delivery stream.
#[derive(Debug)]
pub struct DeliveryQueue {
    state: Arc<Mutex<QueueState>>,
    listeners: Arc<DeliveryListeners>,
    metrics: Arc<PipelineMetrics>,
    pacing: Pacing,
}

impl DeliveryQueue {
    /// Create a queue paced by `config`.
    pub fn new(config: &DeliveryConfig, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            listeners: DeliveryListeners::new(),
            metrics,
            pacing: Pacing {
                min_interval: config.min_interval(),
                settle_interval: config.settle_interval(),
                backlog_warn_threshold: config.backlog_warn_threshold,
            },
        }
    }

    /// Insert a notification unless one with the same id is already queued.
    ///
    /// Returns whether it was inserted. Starts the drain task if it is not
    /// running. Must be called from within a Tokio runtime.
    pub fn enqueue(&self, notification: NotificationEvent, priority: Priority) -> bool {
        let mut state = self.lock();

        if state.closed {
            debug!(notification_id = %notification.id, "Queue is shut down, ignoring enqueue");
            return false;
        }

        if state.items.iter().any(|item| item.notification.id == notification.id) {
            trace!(notification_id = %notification.id, "Notification already queued");
            self.metrics.record_duplicate();
            return false;
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        let item = QueuedItem {
            notification,
            priority,
            enqueued_at: Instant::now(),
            seq,
        };

        let position = state.items.partition_point(|queued| queued.precedes(&item));
        debug!(
            notification_id = %item.notification.id,
            priority,
            position,
            "Notification enqueued"
        );
        state.items.insert(position, item);
        self.metrics.record_enqueued();

        if state.items.len() == self.pacing.backlog_warn_threshold + 1 {
            warn!(
                pending = state.items.len(),
                "Delivery backlog is growing; queue is unbounded"
            );
        }

        if !state.processing {
            state.processing = true;
            state.drain_task = Some(self.spawn_drain());
        }

        true
    }

    /// Remove a queued, not-yet-delivered notification.
    ///
    /// Returns whether something was removed. An item already taken by the
    /// drain for delivery cannot be cancelled.
    pub fn remove(&self, id: &NotificationId) -> bool {
        let mut state = self.lock();
        let before = state.items.len();
        state.items.retain(|item| &item.notification.id != id);
        let removed = before - state.items.len();
        if removed > 0 {
            debug!(notification_id = %id, "Queued notification removed");
            self.metrics.record_removed(removed);
        }
        removed > 0
    }

    /// Remove every queued notification matching `predicate`.
    ///
    /// Returns the ids removed.
    pub fn remove_where(
        &self,
        mut predicate: impl FnMut(&NotificationEvent) -> bool,
    ) -> Vec<NotificationId> {
        let mut state = self.lock();
        let mut removed = Vec::new();
        state.items.retain(|item| {
            if predicate(&item.notification) {
                removed.push(item.notification.id.clone());
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            self.metrics.record_removed(removed.len());
        }
        removed
    }

    /// Drop all queued notifications. An in-flight delivery is unaffected.
    pub fn clear(&self) {
        let mut state = self.lock();
        let dropped = state.items.len();
        state.items.clear();
        if dropped > 0 {
            debug!(dropped, "Delivery queue cleared");
            self.metrics.record_removed(dropped);
        }
    }

    /// Number of queued, undelivered notifications.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queued notifications in drain order.
    pub fn pending(&self) -> Vec<NotificationEvent> {
        self.lock()
            .items
            .iter()
            .map(|item| item.notification.clone())
            .collect()
    }

    /// Whether the drain task is currently running.
    pub fn is_processing(&self) -> bool {
        self.lock().processing
    }

    /// Whether [`DeliveryQueue::shutdown`] has run.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Register a delivery callback, invoked in delivery order.
    pub fn on_delivery<F>(&self, callback: F) -> DeliverySubscription
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    /// Stop draining, drop pending items and detach every listener.
    ///
    /// Later enqueues are ignored.
    pub fn shutdown(&self) {
        let task = {
            let mut state = self.lock();
            state.closed = true;
            state.processing = false;
            state.items.clear();
            state.drain_task.take()
        };
        if let Some(task) = task {
            task.abort();
        }
        self.listeners.clear();
        debug!("Delivery queue shut down");
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn spawn_drain(&self) -> JoinHandle<()> {
        let drain = Drain {
            state: Arc::clone(&self.state),
            listeners: Arc::clone(&self.listeners),
            metrics: Arc::clone(&self.metrics),
            pacing: self.pacing,
        };
        tokio::spawn(drain.run())
    }
}

impl Drop for DeliveryQueue {
    fn drop(&mut self) {
        if let Some(task) = self.lock().drain_task.take() {
            task.abort();
        }
    }
}

/// What the drain does next.
enum Step {
    Deliver(QueuedItem),
    Wait(Duration),
    Done,
}

/// The background drain process.
struct Drain {
    state: Arc<Mutex<QueueState>>,
    listeners: Arc<DeliveryListeners>,
    metrics: Arc<PipelineMetrics>,
    pacing: Pacing,
}

impl Drain {
    async fn run(self) {
        trace!("Delivery drain started");

        loop {
            let step = {
                let mut state = self.lock();
                let wait = state
                    .last_delivered
                    .map(|last| self.pacing.min_interval.saturating_sub(last.elapsed()))
                    .unwrap_or_default();
                if !wait.is_zero() && !state.items.is_empty() {
                    Step::Wait(wait)
                } else if let Some(item) = state.items.pop_front() {
                    Step::Deliver(item)
                } else {
                    state.processing = false;
                    state.drain_task = None;
                    Step::Done
                }
            };

            let item = match step {
                Step::Deliver(item) => item,
                Step::Wait(wait) => {
                    time::sleep(wait).await;
                    continue;
                }
                Step::Done => break,
            };

            let delivered_at = Instant::now();
            self.lock().last_delivered = Some(delivered_at);
            self.metrics.record_delivered();
            debug!(
                notification_id = %item.notification.id,
                kind = %item.notification.kind,
                priority = item.priority,
                waited_ms = delivered_at.duration_since(item.enqueued_at).as_millis() as u64,
                "Delivering notification"
            );
            self.listeners.emit(&item.notification);

            time::sleep(self.pacing.settle_interval).await;
        }

        trace!("Delivery drain finished");
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
