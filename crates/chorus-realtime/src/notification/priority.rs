//! Notification priority ranking.

use chorus_core::types::NotificationKind;

/// Urgency used to order pending deliveries; higher is more urgent.
pub type Priority = i32;

/// Priority of kinds this client does not recognize.
pub const DEFAULT_PRIORITY: Priority = 1;

/// Map a notification kind to its delivery priority.
pub fn priority_of(kind: NotificationKind) -> Priority {
    match kind {
        NotificationKind::Message => 10,
        NotificationKind::Mention => 9,
        NotificationKind::Achievement => 8,
        NotificationKind::Badge => 7,
        NotificationKind::System => 6,
        NotificationKind::GroupInvite => 5,
        NotificationKind::Comment => 4,
        NotificationKind::Like => 3,
        NotificationKind::Follow => 2,
        NotificationKind::Unknown => DEFAULT_PRIORITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking() {
        let ordered = [
            NotificationKind::Message,
            NotificationKind::Mention,
            NotificationKind::Achievement,
            NotificationKind::Badge,
            NotificationKind::System,
            NotificationKind::GroupInvite,
            NotificationKind::Comment,
            NotificationKind::Like,
            NotificationKind::Follow,
            NotificationKind::Unknown,
        ];
        let priorities: Vec<Priority> = ordered.iter().map(|k| priority_of(*k)).collect();
        assert_eq!(priorities, vec![10, 9, 8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_unrecognized_kind_gets_default() {
        let kind = NotificationKind::from_str_value("streak_reminder");
        assert_eq!(priority_of(kind), DEFAULT_PRIORITY);
    }
}
