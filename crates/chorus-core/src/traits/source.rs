//! Real-time event source collaborator.
//!
//! An [`EventSource`] wraps a push channel. Each successful
//! [`EventSource::connect`] yields a [`SourceHandle`]: a lazy, unbounded
//! sequence of [`SourceEvent`]s plus a command sender for the subscribe
//! intent and read receipts. A handle is not restartable; reconnecting means
//! calling `connect` again.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::result::AppResult;
use crate::types::{NotificationEvent, NotificationId};

/// Signals emitted by an event source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// The transport is up.
    Connected,
    /// The transport went down.
    Disconnected {
        /// Why, if known.
        reason: Option<String>,
    },
    /// A validated notification arrived.
    Notification(NotificationEvent),
    /// The server confirmed a notification was read (e.g. on another device).
    ReadConfirmed(NotificationId),
}

/// Commands the pipeline sends back over the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCommand {
    /// Ask the server to push this user's notifications.
    Subscribe,
    /// Read receipt.
    MarkRead(NotificationId),
}

/// A live connection to an event source.
#[derive(Debug)]
pub struct SourceHandle {
    /// Inbound events in arrival order.
    pub events: mpsc::Receiver<SourceEvent>,
    /// Outbound commands.
    pub commands: mpsc::Sender<SourceCommand>,
}

impl SourceHandle {
    /// Bundle the two channel ends.
    pub fn new(events: mpsc::Receiver<SourceEvent>, commands: mpsc::Sender<SourceCommand>) -> Self {
        Self { events, commands }
    }
}

/// Factory for source connections.
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    /// Open a connection authenticated with `auth_token`.
    async fn connect(&self, auth_token: &str) -> AppResult<SourceHandle>;
}
