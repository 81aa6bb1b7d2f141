//! Pipeline metrics counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Pipeline-level metrics counters.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Notifications received from the source
    pub events_received: AtomicU64,
    /// Payloads dropped at the adapter boundary
    pub events_malformed: AtomicU64,
    /// Events dropped because the id was already held or queued
    pub duplicates_dropped: AtomicU64,
    /// Events suppressed by the UI context
    pub suppressed: AtomicU64,
    /// Items inserted into the delivery queue
    pub enqueued: AtomicU64,
    /// Items removed from the queue before delivery
    pub removed: AtomicU64,
    /// Items delivered to listeners
    pub delivered: AtomicU64,
    /// Read receipts propagated
    pub receipts_sent: AtomicU64,
    /// Read receipts that failed to propagate
    pub receipts_failed: AtomicU64,
}

impl PipelineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a received notification
    pub fn record_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a malformed payload
    pub fn record_malformed(&self) {
        self.events_malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped duplicate
    pub fn record_duplicate(&self) {
        self.duplicates_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a suppression
    pub fn record_suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an enqueue
    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record removals
    pub fn record_removed(&self, count: usize) {
        self.removed.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a delivery
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a read receipt outcome
    pub fn record_receipt(&self, ok: bool) {
        if ok {
            self.receipts_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.receipts_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_malformed: self.events_malformed.load(Ordering::Relaxed),
            duplicates_dropped: self.duplicates_dropped.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            receipts_sent: self.receipts_sent.load(Ordering::Relaxed),
            receipts_failed: self.receipts_failed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Notifications received from the source
    pub events_received: u64,
    /// Payloads dropped at the adapter boundary
    pub events_malformed: u64,
    /// Duplicates dropped
    pub duplicates_dropped: u64,
    /// Suppressed by UI context
    pub suppressed: u64,
    /// Inserted into the queue
    pub enqueued: u64,
    /// Removed before delivery
    pub removed: u64,
    /// Delivered to listeners
    pub delivered: u64,
    /// Read receipts propagated
    pub receipts_sent: u64,
    /// Read receipts failed
    pub receipts_failed: u64,
}
