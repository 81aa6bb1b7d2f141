//! Delivery listener registry with scoped subscriptions.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::error;

use chorus_core::types::NotificationEvent;

/// Callback invoked with each delivered notification.
pub type DeliveryCallback = Arc<dyn Fn(&NotificationEvent) + Send + Sync>;

/// Registry of delivery callbacks.
///
/// Emission is fire-and-forget: having no listener is not an error, and a
/// panicking listener is logged without affecting the others.
#[derive(Default)]
pub struct DeliveryListeners {
    /// Subscription ID → callback.
    callbacks: DashMap<u64, DeliveryCallback>,
    /// Next subscription ID.
    next_id: AtomicU64,
}

impl std::fmt::Debug for DeliveryListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryListeners")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

impl DeliveryListeners {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a callback; dropping the returned subscription unregisters it.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> DeliverySubscription
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks.insert(id, Arc::new(callback));
        DeliverySubscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Invokes every registered callback with `notification`.
    pub fn emit(&self, notification: &NotificationEvent) {
        // Snapshot first so callbacks may (un)subscribe without deadlocking.
        let callbacks: Vec<DeliveryCallback> = self
            .callbacks
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(notification))).is_err() {
                error!(
                    notification_id = %notification.id,
                    "Delivery listener panicked"
                );
            }
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether no callback is registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Detaches every callback.
    pub fn clear(&self) {
        self.callbacks.clear();
    }

    fn remove(&self, id: u64) {
        self.callbacks.remove(&id);
    }
}

/// Scoped registration of a delivery callback.
#[derive(Debug)]
#[must_use = "dropping the subscription unregisters the listener"]
pub struct DeliverySubscription {
    id: u64,
    registry: Weak<DeliveryListeners>,
}

impl DeliverySubscription {
    /// Unregisters now instead of at drop.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for DeliverySubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}
