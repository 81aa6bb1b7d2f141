//! Shared, observable UI context.

use tokio::sync::watch;

use chorus_core::types::UiContext;

/// Holder for the latest [`UiContext`] reported by the presentation layer.
///
/// Cloning shares the same underlying value.
#[derive(Debug, Clone)]
pub struct UiContextHandle {
    tx: std::sync::Arc<watch::Sender<UiContext>>,
}

impl UiContextHandle {
    /// Create a handle holding `initial`.
    pub fn new(initial: UiContext) -> Self {
        let (tx, _) = watch::channel(initial);
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> UiContext {
        self.tx.borrow().clone()
    }

    /// Replace the context.
    pub fn set(&self, context: UiContext) {
        self.tx.send_replace(context);
    }

    /// Modify the context in place.
    pub fn update(&self, f: impl FnOnce(&mut UiContext)) {
        self.tx.send_modify(f);
    }

    /// Watch for changes.
    pub fn subscribe(&self) -> watch::Receiver<UiContext> {
        self.tx.subscribe()
    }
}

impl Default for UiContextHandle {
    fn default() -> Self {
        Self::new(UiContext::default())
    }
}
