//! Held notifications and their read state.
//!
//! The tracker keeps the notifications the client has seen, most recent
//! first. Marking one read updates local state optimistically and then
//! propagates a receipt through the [`ReadReceiptSink`]; a failed receipt is
//! logged and never rolled back. A later [`ReadStateTracker::replace_all`]
//! with the server's list reconciles.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use chorus_core::traits::ReadReceiptSink;
use chorus_core::types::{NotificationEvent, NotificationId};

use crate::metrics::PipelineMetrics;

#[derive(Debug, Default)]
struct Held {
    /// Most recent first.
    items: VecDeque<NotificationEvent>,
    ids: HashSet<NotificationId>,
}

/// Tracks held notifications and their read flags.
pub struct ReadStateTracker {
    held: Mutex<Held>,
    receipts: Arc<dyn ReadReceiptSink>,
    metrics: Arc<PipelineMetrics>,
}

impl std::fmt::Debug for ReadStateTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadStateTracker")
            .field("held", &self.len())
            .finish()
    }
}

impl ReadStateTracker {
    /// Creates an empty tracker that propagates receipts to `receipts`.
    pub fn new(receipts: Arc<dyn ReadReceiptSink>, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            held: Mutex::new(Held::default()),
            receipts,
            metrics,
        }
    }

    /// Holds a newly arrived notification at the front.
    ///
    /// Returns `false` if a notification with this id is already held.
    pub fn hold(&self, notification: NotificationEvent) -> bool {
        let mut held = self.lock();
        if !held.ids.insert(notification.id.clone()) {
            return false;
        }
        held.items.push_front(notification);
        true
    }

    /// Whether a notification with `id` is held.
    pub fn contains(&self, id: &NotificationId) -> bool {
        self.lock().ids.contains(id)
    }

    /// Held notifications, most recent first.
    pub fn notifications(&self) -> Vec<NotificationEvent> {
        self.lock().items.iter().cloned().collect()
    }

    /// Number of held notifications.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count of held notifications not yet read.
    pub fn unread_count(&self) -> usize {
        self.lock().items.iter().filter(|n| !n.is_read).count()
    }

    /// Marks `id` read locally and propagates the receipt.
    ///
    /// Idempotent: returns `false` and sends nothing when the notification
    /// is unknown or already read.
    pub async fn mark_read(&self, id: &NotificationId) -> bool {
        if !self.set_read(id) {
            debug!(notification_id = %id, "Mark read skipped (unknown or already read)");
            return false;
        }

        match self.receipts.mark_notification_read(id).await {
            Ok(()) => {
                self.metrics.record_receipt(true);
            }
            Err(e) => {
                self.metrics.record_receipt(false);
                warn!(
                    notification_id = %id,
                    error = %e,
                    "Failed to persist read receipt; keeping local state"
                );
            }
        }
        true
    }

    /// Applies a read confirmed by the server; sends no receipt.
    pub fn confirm_read(&self, id: &NotificationId) -> bool {
        self.set_read(id)
    }

    /// Ids of held notifications that are unread.
    pub fn unread_ids(&self) -> Vec<NotificationId> {
        self.lock()
            .items
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Replaces held state with an authoritative list.
    ///
    /// The list is ordered most recent first by `created_at`; duplicate ids
    /// keep their first occurrence.
    pub fn replace_all(&self, mut notifications: Vec<NotificationEvent>) {
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut held = Held::default();
        for notification in notifications {
            if held.ids.insert(notification.id.clone()) {
                held.items.push_back(notification);
            }
        }
        debug!(count = held.items.len(), "Held notifications replaced");
        *self.lock() = held;
    }

    /// Drops every held notification.
    pub fn clear(&self) {
        *self.lock() = Held::default();
    }

    fn set_read(&self, id: &NotificationId) -> bool {
        let mut held = self.lock();
        match held.items.iter_mut().find(|n| &n.id == id) {
            Some(n) if !n.is_read => {
                n.is_read = true;
                true
            }
            _ => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Held> {
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }
}
