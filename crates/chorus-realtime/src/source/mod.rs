//! Event source adapters.
//!
//! Adapters turn raw socket frames into typed [`SourceEvent`]s at the
//! boundary. Malformed frames are logged and dropped here so nothing
//! untyped reaches the pipeline.

pub mod memory;
pub mod receipts;
pub mod ws;

use std::sync::RwLock;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use chorus_core::error::AppError;
use chorus_core::result::AppResult;
use chorus_core::traits::{SourceCommand, SourceEvent};
use chorus_core::types::NotificationId;

use crate::message::serializer::deserialize_server;
use crate::message::validator::{validate_inbound, validate_notification};
use crate::message::ServerMessage;
use crate::metrics::PipelineMetrics;

pub use memory::{ChannelController, ChannelPeer, ChannelSource};
pub use receipts::SocketReadReceipts;
pub use ws::WebSocketSource;

/// Decode one text frame into a source event.
///
/// Returns `None` for frames that carry nothing for the pipeline and for
/// malformed ones; the latter are logged and counted.
pub fn event_from_frame(text: &str, metrics: Option<&PipelineMetrics>) -> Option<SourceEvent> {
    let malformed = |reason: &AppError| {
        warn!(error = %reason, "Dropping malformed frame");
        if let Some(metrics) = metrics {
            metrics.record_malformed();
        }
    };

    if let Err(e) = validate_inbound(text) {
        malformed(&e);
        return None;
    }

    let message = match deserialize_server(text) {
        Ok(message) => message,
        Err(e) => {
            malformed(&AppError::from(e));
            return None;
        }
    };

    match message {
        ServerMessage::NewNotification { notification } => match validate_notification(notification) {
            Ok(event) => Some(SourceEvent::Notification(event)),
            Err(e) => {
                malformed(&e);
                None
            }
        },
        ServerMessage::NotificationRead { notification_id } => {
            let id = notification_id.trim();
            if id.is_empty() {
                malformed(&AppError::validation("notification_read without id"));
                return None;
            }
            Some(SourceEvent::ReadConfirmed(NotificationId::new(id)))
        }
        ServerMessage::Subscribed { channel } => {
            debug!(channel = ?channel, "Notification subscription acknowledged");
            None
        }
        ServerMessage::Unknown => {
            trace!("Ignoring unhandled server message");
            None
        }
    }
}

/// Command sender of the current connection, if any.
///
/// Shared between the engine, which installs the sender on connect, and the
/// socket read-receipt sink.
#[derive(Debug, Default)]
pub struct CommandSlot {
    sender: RwLock<Option<mpsc::Sender<SourceCommand>>>,
}

impl CommandSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the sender of a new connection.
    pub fn set(&self, sender: mpsc::Sender<SourceCommand>) {
        *self.sender.write().unwrap_or_else(|e| e.into_inner()) = Some(sender);
    }

    /// Forget the current sender.
    pub fn clear(&self) {
        *self.sender.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Whether a live sender is installed.
    pub fn is_connected(&self) -> bool {
        self.current().is_some_and(|sender| !sender.is_closed())
    }

    /// Send a command over the current connection.
    pub async fn send(&self, command: SourceCommand) -> AppResult<()> {
        let sender = self
            .current()
            .ok_or_else(|| AppError::transport("Not connected"))?;
        sender
            .send(command)
            .await
            .map_err(|_| AppError::transport("Connection closed"))
    }

    fn current(&self) -> Option<mpsc::Sender<SourceCommand>> {
        self.sender
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
