//! Snapshot of transient UI state.

use serde::{Deserialize, Serialize};

use super::id::ConversationId;

/// What the user is looking at right now.
///
/// Supplied by the presentation layer; the pipeline reads it but never owns
/// or persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiContext {
    /// Current visible route (path only).
    pub current_path: String,
    /// Conversation open in the foreground, if any.
    #[serde(default)]
    pub active_conversation_id: Option<ConversationId>,
    /// Whether the application has user focus.
    pub is_tab_active: bool,
    /// Optional per-user feedback preferences.
    #[serde(default)]
    pub user_settings: Option<UserSettings>,
}

impl Default for UiContext {
    fn default() -> Self {
        Self {
            current_path: "/".to_string(),
            active_conversation_id: None,
            is_tab_active: true,
            user_settings: None,
        }
    }
}

impl UiContext {
    /// Context for a focused tab on the given route.
    pub fn on_path(path: impl Into<String>) -> Self {
        Self {
            current_path: path.into(),
            ..Self::default()
        }
    }

    /// Set the active conversation.
    pub fn with_conversation(mut self, id: impl Into<ConversationId>) -> Self {
        self.active_conversation_id = Some(id.into());
        self
    }

    /// Set tab focus.
    pub fn with_tab_active(mut self, active: bool) -> Self {
        self.is_tab_active = active;
        self
    }
}

/// Per-user feedback preferences. Absent flags leave the configured default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Play a tone on delivery.
    #[serde(default)]
    pub sound: Option<bool>,
    /// Pulse the haptic motor on delivery.
    #[serde(default)]
    pub vibration: Option<bool>,
    /// Show toasts while the tab is active. Carried, not enforced.
    #[serde(default)]
    pub show_when_active: Option<bool>,
}
