//! In-process event source.
//!
//! [`ChannelSource`] hands each connection to a [`ChannelController`] as a
//! [`ChannelPeer`], which plays the server side: it pushes events and reads
//! the commands the pipeline sends back. Used for embedding and tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use chorus_core::error::AppError;
use chorus_core::result::AppResult;
use chorus_core::traits::{EventSource, SourceCommand, SourceEvent, SourceHandle};
use chorus_core::types::{NotificationEvent, NotificationId};

use crate::metrics::PipelineMetrics;

use super::event_from_frame;

#[derive(Debug, Default)]
struct Shared {
    refuse: AtomicBool,
    connects: AtomicUsize,
}

/// Event source backed by in-memory channels.
#[derive(Debug, Clone)]
pub struct ChannelSource {
    peers: mpsc::UnboundedSender<ChannelPeer>,
    shared: Arc<Shared>,
    buffer: usize,
}

impl ChannelSource {
    /// Create a source and the controller that receives its connections.
    pub fn new(buffer: usize) -> (Self, ChannelController) {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());
        let source = Self {
            peers: peers_tx,
            shared: Arc::clone(&shared),
            buffer: buffer.max(1),
        };
        let controller = ChannelController {
            peers: peers_rx,
            shared,
        };
        (source, controller)
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn connect(&self, auth_token: &str) -> AppResult<SourceHandle> {
        self.shared.connects.fetch_add(1, Ordering::Relaxed);
        if self.shared.refuse.load(Ordering::Relaxed) {
            return Err(AppError::transport("Connection refused"));
        }
        if auth_token.trim().is_empty() {
            return Err(AppError::authentication("Empty auth token"));
        }

        let (events_tx, events_rx) = mpsc::channel(self.buffer);
        let (commands_tx, commands_rx) = mpsc::channel(self.buffer);
        events_tx
            .try_send(SourceEvent::Connected)
            .map_err(|_| AppError::internal("Event channel unavailable"))?;

        let peer = ChannelPeer {
            token: auth_token.to_string(),
            events: events_tx,
            commands: commands_rx,
        };
        self.peers
            .send(peer)
            .map_err(|_| AppError::transport("No controller is accepting connections"))?;
        debug!("In-memory source connected");

        Ok(SourceHandle::new(events_rx, commands_tx))
    }
}

/// Server side of a [`ChannelSource`].
#[derive(Debug)]
pub struct ChannelController {
    peers: mpsc::UnboundedReceiver<ChannelPeer>,
    shared: Arc<Shared>,
}

impl ChannelController {
    /// Wait for the next connection.
    pub async fn accept(&mut self) -> Option<ChannelPeer> {
        self.peers.recv().await
    }

    /// Make later `connect` calls fail with a transport error.
    pub fn refuse_connections(&self, refuse: bool) {
        self.shared.refuse.store(refuse, Ordering::Relaxed);
    }

    /// Number of `connect` attempts so far.
    pub fn connect_attempts(&self) -> usize {
        self.shared.connects.load(Ordering::Relaxed)
    }
}

/// One accepted connection.
#[derive(Debug)]
pub struct ChannelPeer {
    token: String,
    events: mpsc::Sender<SourceEvent>,
    commands: mpsc::Receiver<SourceCommand>,
}

impl ChannelPeer {
    /// Token the client connected with.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Push a notification.
    pub async fn push(&self, notification: NotificationEvent) -> AppResult<()> {
        self.emit(SourceEvent::Notification(notification)).await
    }

    /// Push a raw JSON frame through boundary validation.
    ///
    /// Malformed frames are dropped, as the socket adapter does.
    pub async fn push_frame(&self, text: &str, metrics: Option<&PipelineMetrics>) -> AppResult<()> {
        match event_from_frame(text, metrics) {
            Some(event) => self.emit(event).await,
            None => Ok(()),
        }
    }

    /// Confirm a read from the server side.
    pub async fn confirm_read(&self, id: impl Into<NotificationId>) -> AppResult<()> {
        self.emit(SourceEvent::ReadConfirmed(id.into())).await
    }

    /// Announce a disconnect and close the event stream.
    pub async fn disconnect(self, reason: Option<&str>) -> AppResult<()> {
        self.emit(SourceEvent::Disconnected {
            reason: reason.map(str::to_string),
        })
        .await
    }

    /// Next command from the client.
    pub async fn next_command(&mut self) -> Option<SourceCommand> {
        self.commands.recv().await
    }

    /// A command already sent by the client, without waiting.
    pub fn try_command(&mut self) -> Option<SourceCommand> {
        self.commands.try_recv().ok()
    }

    async fn emit(&self, event: SourceEvent) -> AppResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| AppError::transport("Client hung up"))
    }
}
