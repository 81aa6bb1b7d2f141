//! Read receipts over the real-time socket.

use std::sync::Arc;

use async_trait::async_trait;

use chorus_core::result::AppResult;
use chorus_core::traits::{ReadReceiptSink, SourceCommand};
use chorus_core::types::NotificationId;

use super::CommandSlot;

/// Sends `mark_notification_read` over the current connection.
///
/// Fails with a transport error while disconnected; the tracker logs that
/// and keeps its optimistic state.
#[derive(Debug, Clone)]
pub struct SocketReadReceipts {
    slot: Arc<CommandSlot>,
}

impl SocketReadReceipts {
    /// Sink sending through `slot`.
    pub fn new(slot: Arc<CommandSlot>) -> Self {
        Self { slot }
    }
}

#[async_trait]
impl ReadReceiptSink for SocketReadReceipts {
    async fn mark_notification_read(&self, id: &NotificationId) -> AppResult<()> {
        self.slot.send(SourceCommand::MarkRead(id.clone())).await
    }
}
