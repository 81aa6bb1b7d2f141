//! Context-based suppression of redundant notifications.

use std::sync::LazyLock;

use url::Url;

use chorus_core::types::{ConversationId, NotificationEvent, NotificationKind, UiContext};

/// Base used to resolve path-only action URLs.
static BASE: LazyLock<Option<Url>> = LazyLock::new(|| Url::parse("http://localhost/").ok());

/// Decide whether a notification should be surfaced given the current UI.
///
/// Suppressed when the tab is in the background, when a `message` targets
/// the conversation already open, or when the action URL resolves to the
/// route being viewed. No other kind-specific rules apply.
pub fn should_show(notification: &NotificationEvent, context: &UiContext) -> bool {
    if !context.is_tab_active {
        return false;
    }

    if let (Some(conversation), Some(active)) = (
        conversation_id(notification),
        context.active_conversation_id.as_ref(),
    ) {
        if &conversation == active {
            return false;
        }
    }

    if let Some(target) = notification.action_url.as_deref().and_then(resolve_path) {
        if resolve_path(&context.current_path).is_some_and(|current| current == target) {
            return false;
        }
    }

    true
}

/// The conversation a `message` notification points at.
///
/// Taken from the segment after `chat` in the resolved action path, so a
/// host named `chat` does not count. `None` for other kinds.
pub fn conversation_id(notification: &NotificationEvent) -> Option<ConversationId> {
    if notification.kind != NotificationKind::Message {
        return None;
    }
    let path = resolve_path(notification.action_url.as_deref()?)?;
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if segment == "chat" {
            return segments.next().map(ConversationId::from);
        }
    }
    None
}

/// Path portion of an absolute URL or a path-only string.
///
/// Query and fragment are discarded. Returns `None` for blank or
/// unparseable input.
pub fn resolve_path(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    let base = BASE.as_ref()?;
    base.join(trimmed).ok().map(|resolved| resolved.path().to_string())
}
