//! Inbound and outbound socket message definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use chorus_core::traits::SourceCommand;
use chorus_core::types::NotificationId;

/// Messages pushed by the server to the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A new notification for the current user.
    NewNotification {
        /// Unvalidated payload.
        notification: RawNotification,
    },
    /// A notification was read elsewhere (another tab or device).
    NotificationRead {
        /// Notification ID.
        #[serde(rename = "notificationId", alias = "notification_id")]
        notification_id: String,
    },
    /// Subscription acknowledged.
    Subscribed {
        /// Channel name, if the server echoes one.
        #[serde(default)]
        channel: Option<String>,
    },
    /// Any message type this client does not handle.
    #[serde(other)]
    Unknown,
}

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for this user's notifications to be pushed.
    SubscribeNotifications,
    /// Read receipt.
    MarkNotificationRead {
        /// Notification ID.
        #[serde(rename = "notificationId")]
        notification_id: NotificationId,
    },
}

impl From<SourceCommand> for ClientMessage {
    fn from(command: SourceCommand) -> Self {
        match command {
            SourceCommand::Subscribe => Self::SubscribeNotifications,
            SourceCommand::MarkRead(notification_id) => {
                Self::MarkNotificationRead { notification_id }
            }
        }
    }
}

/// A notification payload exactly as the backend sent it.
///
/// Every field is optional here; [`super::validator::validate_notification`]
/// decides what is usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    /// Server id; a string or a number.
    #[serde(default, alias = "_id")]
    pub id: Option<Value>,
    /// Owning user.
    #[serde(default)]
    pub user_id: Option<Value>,
    /// Kind name.
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Body text.
    #[serde(default, alias = "message")]
    pub body: Option<String>,
    /// Target route.
    #[serde(default)]
    pub action_url: Option<String>,
    /// Originating user id.
    #[serde(default)]
    pub actor_id: Option<Value>,
    /// Originating user display data.
    #[serde(default)]
    pub actor: Option<Value>,
    /// RFC 3339 creation time.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Read flag.
    #[serde(default)]
    pub is_read: Option<bool>,
}
