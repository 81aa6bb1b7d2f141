//! The notification event as held by the client.
//!
//! A [`NotificationEvent`] is immutable once it has crossed the adapter
//! boundary. Only the read flag is tracked separately, by the read-state
//! tracker.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{NotificationId, UserId};

/// Closed set of notification kinds the backend emits.
///
/// Kinds this client does not know about deserialize to [`Self::Unknown`]
/// instead of failing, so a newer server never breaks delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A direct chat message.
    Message,
    /// Someone liked a post.
    Like,
    /// Someone commented on a post.
    Comment,
    /// Someone followed the user.
    Follow,
    /// Invitation to join a group.
    GroupInvite,
    /// A badge was awarded.
    Badge,
    /// The user was mentioned.
    Mention,
    /// Platform announcement.
    System,
    /// A learning achievement was unlocked.
    Achievement,
    /// Any kind this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl NotificationKind {
    /// Parse from the wire string, mapping unrecognized values to `Unknown`.
    pub fn from_str_value(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "message" => Self::Message,
            "like" => Self::Like,
            "comment" => Self::Comment,
            "follow" => Self::Follow,
            "group_invite" => Self::GroupInvite,
            "badge" => Self::Badge,
            "mention" => Self::Mention,
            "system" => Self::System,
            "achievement" => Self::Achievement,
            _ => Self::Unknown,
        }
    }

    /// Convert to the wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Follow => "follow",
            Self::GroupInvite => "group_invite",
            Self::Badge => "badge",
            Self::Mention => "mention",
            Self::System => "system",
            Self::Achievement => "achievement",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display data about the user who caused a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// The actor's user id.
    pub id: UserId,
    /// Username, if the server sent one.
    #[serde(default)]
    pub username: Option<String>,
    /// Display name, if the server sent one.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar URL, if any.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A validated notification as delivered to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Server-assigned id, used for deduplication.
    pub id: NotificationId,
    /// The owning user.
    pub user_id: Option<UserId>,
    /// Notification kind.
    pub kind: NotificationKind,
    /// Display title.
    pub title: String,
    /// Display body.
    pub body: String,
    /// Target route, e.g. `/chat/{conversationId}` or `/groups/42`.
    pub action_url: Option<String>,
    /// Originating user id.
    pub actor_id: Option<UserId>,
    /// Originating user display data.
    pub actor: Option<Actor>,
    /// Server-side creation time (display only).
    pub created_at: DateTime<Utc>,
    /// Read flag; socket-origin events are never authoritative here.
    pub is_read: bool,
}

impl NotificationEvent {
    /// Create a notification with the given id and kind and empty display data.
    pub fn new(id: impl Into<NotificationId>, kind: NotificationKind) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            kind,
            title: String::new(),
            body: String::new(),
            action_url: None,
            actor_id: None,
            actor: None,
            created_at: Utc::now(),
            is_read: false,
        }
    }

    /// Set the title and body.
    pub fn with_text(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.title = title.into();
        self.body = body.into();
        self
    }

    /// Set the action URL.
    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    /// Set the read flag.
    pub fn with_read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }
}
