//! The notification engine: an explicitly constructed pipeline instance.
//!
//! The engine owns the source connection, the delivery queue, the read-state
//! tracker and the feedback effects, and exposes the state surfaces a
//! presentation layer needs. Nothing here is process-global; a composition
//! root builds one engine and calls [`NotificationEngine::shutdown`] when the
//! application goes away.

use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time;
use tracing::{debug, info, trace, warn};

use chorus_core::config::{ConnectionConfig, DeliveryConfig, EffectsConfig};
use chorus_core::error::AppError;
use chorus_core::result::AppResult;
use chorus_core::traits::{EventSource, ReadReceiptSink, SessionProvider, SourceCommand, SourceEvent};
use chorus_core::types::{NotificationEvent, NotificationId, UiContext};

use crate::effects::{AudioSink, EffectDispatcher, HapticSink};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::notification::filter;
use crate::notification::{
    DeliveryQueue, DeliverySubscription, DispatchOutcome, NotificationDispatcher,
    ReadStateTracker, UiContextHandle,
};
use crate::source::{CommandSlot, SocketReadReceipts};

struct EngineInner {
    connection: ConnectionConfig,
    source: Arc<dyn EventSource>,
    session: Arc<dyn SessionProvider>,
    store: Arc<ReadStateTracker>,
    queue: Arc<DeliveryQueue>,
    dispatcher: NotificationDispatcher,
    context: UiContextHandle,
    effects: Arc<EffectDispatcher>,
    metrics: Arc<PipelineMetrics>,
    slot: Arc<CommandSlot>,
    connected: watch::Sender<bool>,
    /// Pump of the current connection; held across connect so starts serialize.
    pump: AsyncMutex<Option<AbortHandle>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    effects_subscription: Mutex<Option<DeliverySubscription>>,
}

/// Client-side notification pipeline.
pub struct NotificationEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for NotificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationEngine")
            .field("connected", &self.is_connected())
            .field("held", &self.inner.store.len())
            .field("pending", &self.inner.queue.len())
            .finish()
    }
}

impl NotificationEngine {
    /// Start building an engine.
    pub fn builder() -> NotificationEngineBuilder {
        NotificationEngineBuilder::default()
    }

    /// Connect to the event source and start consuming events.
    ///
    /// Returns `Ok(false)` without connecting when no user is signed in. A
    /// failed connect leaves the engine disconnected and returns the error;
    /// retrying is up to the caller. While a connection's events are still
    /// being consumed, further calls return `Ok(true)` without reconnecting.
    pub async fn start(&self) -> AppResult<bool> {
        let inner = &self.inner;
        let Some(token) = inner
            .session
            .auth_token()
            .filter(|_| inner.session.is_authenticated())
        else {
            debug!("No authenticated user, not subscribing");
            inner.store.clear();
            inner.queue.clear();
            return Ok(false);
        };

        let mut current = inner.pump.lock().await;
        if current.as_ref().is_some_and(|pump| !pump.is_finished()) {
            debug!("Notification source already started");
            return Ok(true);
        }

        let handle = match inner.source.connect(&token).await {
            Ok(handle) => handle,
            Err(e) => {
                inner.connected.send_replace(false);
                warn!(error = %e, "Failed to connect notification source");
                return Err(e);
            }
        };

        inner.slot.set(handle.commands.clone());
        let pump = tokio::spawn(pump(Arc::clone(inner), handle.events));
        *current = Some(pump.abort_handle());
        inner.track(pump);
        Ok(true)
    }

    /// Register a callback for each delivered notification, in delivery order.
    pub fn on_delivery<F>(&self, callback: F) -> DeliverySubscription
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        self.inner.queue.on_delivery(callback)
    }

    /// Held notifications, most recent first.
    pub fn notifications(&self) -> Vec<NotificationEvent> {
        self.inner.store.notifications()
    }

    /// Number of held notifications not yet read.
    pub fn unread_count(&self) -> usize {
        self.inner.store.unread_count()
    }

    /// Mark one notification read and propagate the receipt.
    ///
    /// A pending delivery of the same notification is cancelled.
    pub async fn mark_as_read(&self, id: &NotificationId) -> bool {
        self.inner.queue.remove(id);
        self.inner.store.mark_read(id).await
    }

    /// Mark every held unread notification read. Returns how many changed.
    ///
    /// Covers the whole held list, so queued notifications not yet delivered
    /// are marked too and their deliveries cancelled.
    pub async fn mark_all_as_read(&self) -> usize {
        let ids = self.inner.store.unread_ids();
        let cancelled = self.inner.queue.remove_where(|n| ids.contains(&n.id));
        let mut marked = 0;
        for id in &ids {
            if self.inner.store.mark_read(id).await {
                marked += 1;
            }
        }
        debug!(marked, cancelled = cancelled.len(), "Marked all notifications read");
        marked
    }

    /// Whether the transport is up.
    pub fn is_connected(&self) -> bool {
        *self.inner.connected.borrow()
    }

    /// Watch the transport state.
    pub fn connection(&self) -> watch::Receiver<bool> {
        self.inner.connected.subscribe()
    }

    /// Current UI context.
    pub fn context(&self) -> UiContext {
        self.inner.context.snapshot()
    }

    /// Replace the UI context.
    ///
    /// Queued notifications the new context would suppress are removed.
    pub fn set_context(&self, context: UiContext) {
        self.inner.context.set(context);
        self.inner.apply_context();
    }

    /// Modify the UI context in place; see [`NotificationEngine::set_context`].
    pub fn update_context(&self, f: impl FnOnce(&mut UiContext)) {
        self.inner.context.update(f);
        self.inner.apply_context();
    }

    /// Replace held notifications with the server's authoritative list.
    ///
    /// Queued notifications the list reports as read are removed.
    pub fn refresh(&self, notifications: Vec<NotificationEvent>) {
        let read: Vec<NotificationId> = notifications
            .iter()
            .filter(|n| n.is_read)
            .map(|n| n.id.clone())
            .collect();
        self.inner.store.replace_all(notifications);
        let removed = self.inner.queue.remove_where(|n| read.contains(&n.id));
        if !removed.is_empty() {
            debug!(removed = removed.len(), "Dropped queued notifications already read");
        }
    }

    /// Queued, undelivered notifications.
    pub fn pending_count(&self) -> usize {
        self.inner.queue.len()
    }

    /// Pipeline counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Feedback effects, e.g. to change the volume.
    pub fn effects(&self) -> &EffectDispatcher {
        &self.inner.effects
    }

    /// Stop consuming events, drop pending deliveries and detach listeners.
    pub fn shutdown(&self) {
        let inner = &self.inner;
        let tasks = std::mem::take(&mut *inner.lock_tasks());
        for task in tasks {
            task.abort();
        }
        inner.slot.clear();
        inner.connected.send_replace(false);
        inner.queue.shutdown();
        inner
            .effects_subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        info!("Notification engine shut down");
    }
}

impl Drop for NotificationEngine {
    fn drop(&mut self) {
        for task in std::mem::take(&mut *self.inner.lock_tasks()) {
            task.abort();
        }
    }
}

impl EngineInner {
    fn track(&self, task: JoinHandle<()>) {
        let mut tasks = self.lock_tasks();
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply_context(&self) {
        let context = self.context.snapshot();
        self.effects.apply_settings(context.user_settings.as_ref());
        let removed = self
            .queue
            .remove_where(|n| !filter::should_show(n, &context));
        if !removed.is_empty() {
            debug!(
                removed = removed.len(),
                path = %context.current_path,
                "Context change cancelled queued notifications"
            );
        }
    }

    async fn subscribe(&self) {
        if let Err(e) = self.slot.send(SourceCommand::Subscribe).await {
            warn!(error = %e, "Failed to send subscribe");
        }
    }
}

/// Consumes one connection's events until the stream ends.
async fn pump(inner: Arc<EngineInner>, mut events: mpsc::Receiver<SourceEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SourceEvent::Connected => {
                inner.connected.send_replace(true);
                inner.subscribe().await;

                // Second subscribe covers the server missing the first one
                // right after the handshake.
                let delayed = Arc::clone(&inner);
                let delay = inner.connection.resubscribe_delay();
                inner.track(tokio::spawn(async move {
                    time::sleep(delay).await;
                    if delayed.slot.is_connected() {
                        delayed.subscribe().await;
                    }
                }));
            }
            SourceEvent::Disconnected { reason } => {
                info!(reason = ?reason, "Notification source disconnected");
                break;
            }
            SourceEvent::Notification(notification) => {
                let id = notification.id.clone();
                let outcome = inner.dispatcher.handle(notification);
                trace!(notification_id = %id, outcome = ?outcome, "Notification handled");
                if outcome == DispatchOutcome::Unauthenticated {
                    inner.slot.clear();
                }
            }
            SourceEvent::ReadConfirmed(id) => {
                if inner.store.confirm_read(&id) {
                    inner.queue.remove(&id);
                    debug!(notification_id = %id, "Read confirmed by server");
                }
            }
        }
    }

    inner.connected.send_replace(false);
    inner.slot.clear();
    debug!("Notification event stream ended");
}

/// Builder for [`NotificationEngine`].
#[derive(Default)]
pub struct NotificationEngineBuilder {
    connection: ConnectionConfig,
    delivery: DeliveryConfig,
    effects: EffectsConfig,
    source: Option<Arc<dyn EventSource>>,
    session: Option<Arc<dyn SessionProvider>>,
    receipts: Option<Arc<dyn ReadReceiptSink>>,
    audio: Option<Arc<dyn AudioSink>>,
    haptics: Option<Arc<dyn HapticSink>>,
    context: Option<UiContext>,
    metrics: Option<Arc<PipelineMetrics>>,
    slot: Option<Arc<CommandSlot>>,
}

impl NotificationEngineBuilder {
    /// Connection settings.
    pub fn connection(mut self, config: ConnectionConfig) -> Self {
        self.connection = config;
        self
    }

    /// Delivery pacing.
    pub fn delivery(mut self, config: DeliveryConfig) -> Self {
        self.delivery = config;
        self
    }

    /// Feedback settings.
    pub fn effects(mut self, config: EffectsConfig) -> Self {
        self.effects = config;
        self
    }

    /// Event source (required).
    pub fn source(mut self, source: Arc<dyn EventSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Session provider (required).
    pub fn session(mut self, session: Arc<dyn SessionProvider>) -> Self {
        self.session = Some(session);
        self
    }

    /// Read-receipt sink. Defaults to receipts over the socket.
    pub fn read_receipts(mut self, receipts: Arc<dyn ReadReceiptSink>) -> Self {
        self.receipts = Some(receipts);
        self
    }

    /// Audio output.
    pub fn audio(mut self, audio: Arc<dyn AudioSink>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Haptic device.
    pub fn haptics(mut self, haptics: Arc<dyn HapticSink>) -> Self {
        self.haptics = Some(haptics);
        self
    }

    /// Initial UI context.
    pub fn context(mut self, context: UiContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Shared metrics, e.g. the ones the source counts malformed frames in.
    pub fn metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Shared command slot, e.g. one a [`SocketReadReceipts`] was built on.
    pub fn command_slot(mut self, slot: Arc<CommandSlot>) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Assemble the engine. Spawns nothing until [`NotificationEngine::start`].
    pub fn build(self) -> AppResult<NotificationEngine> {
        let source = self
            .source
            .ok_or_else(|| AppError::configuration("Notification engine needs an event source"))?;
        let session = self
            .session
            .ok_or_else(|| AppError::configuration("Notification engine needs a session provider"))?;

        let metrics = self.metrics.unwrap_or_default();
        let slot = self.slot.unwrap_or_default();
        let receipts = self
            .receipts
            .unwrap_or_else(|| Arc::new(SocketReadReceipts::new(Arc::clone(&slot))));

        let store = Arc::new(ReadStateTracker::new(receipts, Arc::clone(&metrics)));
        let queue = Arc::new(DeliveryQueue::new(&self.delivery, Arc::clone(&metrics)));
        let context = UiContextHandle::new(self.context.unwrap_or_default());

        let mut effects = EffectDispatcher::new(&self.effects);
        if let Some(audio) = self.audio {
            effects = effects.with_audio(audio);
        }
        if let Some(haptics) = self.haptics {
            effects = effects.with_haptics(haptics);
        }
        let effects = Arc::new(effects);
        effects.apply_settings(context.snapshot().user_settings.as_ref());

        let effects_for_delivery = Arc::clone(&effects);
        let effects_subscription =
            queue.on_delivery(move |notification| effects_for_delivery.notify(notification.kind));

        let dispatcher = NotificationDispatcher::new(
            Arc::clone(&session),
            Arc::clone(&store),
            Arc::clone(&queue),
            context.clone(),
            Arc::clone(&metrics),
        );

        let (connected, _) = watch::channel(false);

        Ok(NotificationEngine {
            inner: Arc::new(EngineInner {
                connection: self.connection,
                source,
                session,
                store,
                queue,
                dispatcher,
                context,
                effects,
                metrics,
                slot,
                connected,
                pump: AsyncMutex::new(None),
                tasks: Mutex::new(Vec::new()),
                effects_subscription: Mutex::new(Some(effects_subscription)),
            }),
        })
    }
}
