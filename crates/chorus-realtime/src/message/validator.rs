//! Boundary validation: raw payloads into typed notifications.

use chrono::{DateTime, Utc};
use serde_json::Value;

use chorus_core::error::AppError;
use chorus_core::types::{Actor, NotificationEvent, NotificationId, NotificationKind, UserId};

use super::types::RawNotification;

/// Maximum allowed frame size in bytes.
const MAX_MESSAGE_SIZE: usize = 65_536;

/// Validates a raw inbound frame before parsing.
pub fn validate_inbound(raw: &str) -> Result<(), AppError> {
    if raw.len() > MAX_MESSAGE_SIZE {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {} bytes",
            MAX_MESSAGE_SIZE
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Turns a raw payload into a [`NotificationEvent`].
///
/// A missing or blank id is rejected: such an event can be neither
/// deduplicated nor marked read. An unrecognized kind is accepted as
/// [`NotificationKind::Unknown`].
pub fn validate_notification(raw: RawNotification) -> Result<NotificationEvent, AppError> {
    let id = raw
        .id
        .as_ref()
        .and_then(id_string)
        .ok_or_else(|| AppError::validation("Notification has no id"))?;

    let kind = raw
        .kind
        .as_deref()
        .map(NotificationKind::from_str_value)
        .unwrap_or(NotificationKind::Unknown);

    let created_at = raw
        .created_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let actor = raw
        .actor
        .and_then(|value| serde_json::from_value::<Actor>(value).ok());

    Ok(NotificationEvent {
        id: NotificationId::new(id),
        user_id: raw.user_id.as_ref().and_then(id_string).map(UserId::new),
        kind,
        title: raw.title.unwrap_or_default(),
        body: raw.body.unwrap_or_default(),
        action_url: raw.action_url.filter(|url| !url.trim().is_empty()),
        actor_id: raw.actor_id.as_ref().and_then(id_string).map(UserId::new),
        actor,
        created_at,
        is_read: raw.is_read.unwrap_or(false),
    })
}

/// Accepts string and integer ids; anything else (or blank) is no id.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
