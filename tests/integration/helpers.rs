//! Shared test helpers for integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use chorus_core::config::DeliveryConfig;
use chorus_core::error::AppError;
use chorus_core::result::AppResult;
use chorus_core::traits::{ReadReceiptSink, StaticSession};
use chorus_core::types::{NotificationEvent, NotificationId, NotificationKind, UiContext};
use chorus_realtime::effects::AudioSink;
use chorus_realtime::metrics::PipelineMetrics;
use chorus_realtime::notification::{DeliveryQueue, DeliverySubscription};
use chorus_realtime::source::{ChannelController, ChannelSource};
use chorus_realtime::{NotificationEngine, NotificationEngineBuilder};

/// A delivery with the virtual time it happened at.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: String,
    pub at: Instant,
}

/// Records deliveries in order.
#[derive(Debug, Clone, Default)]
pub struct DeliveryLog {
    entries: Arc<Mutex<Vec<Delivery>>>,
}

impl DeliveryLog {
    pub fn record(&self, notification: &NotificationEvent) {
        self.entries.lock().unwrap().push(Delivery {
            id: notification.id.to_string(),
            at: Instant::now(),
        });
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.lock().unwrap().iter().map(|d| d.id.clone()).collect()
    }

    pub fn entries(&self) -> Vec<Delivery> {
        self.entries.lock().unwrap().clone()
    }

    /// Subscribe to a queue's deliveries.
    pub fn attach_queue(&self, queue: &DeliveryQueue) -> DeliverySubscription {
        let log = self.clone();
        queue.on_delivery(move |n| log.record(n))
    }

    /// Subscribe to an engine's deliveries.
    pub fn attach_engine(&self, engine: &NotificationEngine) -> DeliverySubscription {
        let log = self.clone();
        engine.on_delivery(move |n| log.record(n))
    }
}

/// Read-receipt sink that records ids and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingReceipts {
    pub sent: Mutex<Vec<NotificationId>>,
    pub fail: bool,
}

impl RecordingReceipts {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|id| id.to_string()).collect()
    }
}

#[async_trait]
impl ReadReceiptSink for RecordingReceipts {
    async fn mark_notification_read(&self, id: &NotificationId) -> AppResult<()> {
        self.sent.lock().unwrap().push(id.clone());
        if self.fail {
            return Err(AppError::external_service("backend unavailable"));
        }
        Ok(())
    }
}

/// Audio sink that counts tones.
#[derive(Debug, Default)]
pub struct RecordingSpeaker {
    pub tones: Mutex<Vec<usize>>,
}

impl RecordingSpeaker {
    pub fn count(&self) -> usize {
        self.tones.lock().unwrap().len()
    }
}

impl AudioSink for RecordingSpeaker {
    fn sample_rate(&self) -> u32 {
        8_000
    }

    fn play(&self, samples: Arc<Vec<f32>>) -> AppResult<()> {
        self.tones.lock().unwrap().push(samples.len());
        Ok(())
    }
}

/// A queue with default pacing.
pub fn queue() -> DeliveryQueue {
    DeliveryQueue::new(&DeliveryConfig::default(), Arc::new(PipelineMetrics::new()))
}

pub fn note(id: &str, kind: NotificationKind) -> NotificationEvent {
    NotificationEvent::new(id, kind)
}

/// Frame as the server sends it.
pub fn frame(id: &str, kind: &str, action_url: Option<&str>) -> String {
    serde_json::json!({
        "type": "new_notification",
        "notification": {
            "id": id,
            "type": kind,
            "title": format!("{kind} notification"),
            "actionUrl": action_url,
            "createdAt": "2024-05-01T10:00:00Z",
        }
    })
    .to_string()
}

/// Engine wired to an in-memory source.
pub struct TestEngine {
    pub engine: NotificationEngine,
    pub controller: ChannelController,
    pub metrics: Arc<PipelineMetrics>,
    pub speaker: Arc<RecordingSpeaker>,
    pub log: DeliveryLog,
    _subscription: DeliverySubscription,
}

impl TestEngine {
    pub fn new(context: UiContext) -> Self {
        Self::with(context, |builder| builder)
    }

    pub fn with(
        context: UiContext,
        customize: impl FnOnce(NotificationEngineBuilder) -> NotificationEngineBuilder,
    ) -> Self {
        let (source, controller) = ChannelSource::new(32);
        let metrics = Arc::new(PipelineMetrics::new());
        let speaker = Arc::new(RecordingSpeaker::default());
        let builder = NotificationEngine::builder()
            .source(Arc::new(source))
            .session(Arc::new(StaticSession::authenticated("test-token")))
            .metrics(Arc::clone(&metrics))
            .audio(speaker.clone())
            .context(context);
        let engine = customize(builder).build().expect("engine");
        let log = DeliveryLog::default();
        let subscription = log.attach_engine(&engine);
        Self {
            engine,
            controller,
            metrics,
            speaker,
            log,
            _subscription: subscription,
        }
    }
}

/// Let spawned tasks and timers run for `ms` of virtual time.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
