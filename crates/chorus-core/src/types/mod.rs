//! Shared domain types: typed identifiers, the notification model and the
//! UI context snapshot consulted by the suppression filter.

pub mod context;
pub mod id;
pub mod notification;

pub use context::{UiContext, UserSettings};
pub use id::{ConversationId, NotificationId, UserId};
pub use notification::{Actor, NotificationEvent, NotificationKind};
