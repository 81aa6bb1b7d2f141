//! Notification dispatcher: routes arrivals through suppression into the queue.

use std::sync::Arc;

use tracing::{debug, trace};

use chorus_core::traits::SessionProvider;
use chorus_core::types::NotificationEvent;

use crate::metrics::PipelineMetrics;

use super::context::UiContextHandle;
use super::filter;
use super::priority::{Priority, priority_of};
use super::queue::DeliveryQueue;
use super::read_state::ReadStateTracker;

/// What happened to an arriving notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No user is signed in; the event was discarded.
    Unauthenticated,
    /// The id is already held or queued.
    Duplicate,
    /// Held for unread counting but not surfaced.
    Suppressed,
    /// Queued for delivery.
    Enqueued {
        /// Priority it was queued with.
        priority: Priority,
    },
    /// The queue has been shut down.
    Closed,
}

/// Routes validated notifications into the tracker and delivery queue.
pub struct NotificationDispatcher {
    session: Arc<dyn SessionProvider>,
    store: Arc<ReadStateTracker>,
    queue: Arc<DeliveryQueue>,
    context: UiContextHandle,
    metrics: Arc<PipelineMetrics>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("queued", &self.queue.len())
            .field("held", &self.store.len())
            .finish()
    }
}

impl NotificationDispatcher {
    /// Create a dispatcher over the shared pipeline parts.
    pub fn new(
        session: Arc<dyn SessionProvider>,
        store: Arc<ReadStateTracker>,
        queue: Arc<DeliveryQueue>,
        context: UiContextHandle,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            session,
            store,
            queue,
            context,
            metrics,
        }
    }

    /// Handle one arriving notification.
    ///
    /// Every new id is held so it counts as unread even when the current UI
    /// context suppresses its delivery.
    pub fn handle(&self, notification: NotificationEvent) -> DispatchOutcome {
        self.metrics.record_received();

        if !self.session.is_authenticated() {
            debug!(notification_id = %notification.id, "No authenticated user, dropping notification");
            self.store.clear();
            self.queue.clear();
            return DispatchOutcome::Unauthenticated;
        }

        if !self.store.hold(notification.clone()) {
            trace!(notification_id = %notification.id, "Notification already held");
            self.metrics.record_duplicate();
            return DispatchOutcome::Duplicate;
        }

        let context = self.context.snapshot();
        if !filter::should_show(&notification, &context) {
            debug!(
                notification_id = %notification.id,
                kind = %notification.kind,
                path = %context.current_path,
                tab_active = context.is_tab_active,
                "Notification suppressed by UI context"
            );
            self.metrics.record_suppressed();
            return DispatchOutcome::Suppressed;
        }

        let priority = priority_of(notification.kind);
        if self.queue.enqueue(notification, priority) {
            DispatchOutcome::Enqueued { priority }
        } else if self.queue.is_closed() {
            DispatchOutcome::Closed
        } else {
            DispatchOutcome::Duplicate
        }
    }
}
