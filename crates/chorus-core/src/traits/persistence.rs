//! Read-receipt persistence collaborator.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::NotificationId;

/// Propagates "notification read" to the backend.
///
/// Fire-and-forget from the tracker's point of view: a failure is logged and
/// the optimistic local state is kept.
#[async_trait]
pub trait ReadReceiptSink: Send + Sync + 'static {
    /// Record that the notification was read.
    async fn mark_notification_read(&self, id: &NotificationId) -> AppResult<()>;
}
