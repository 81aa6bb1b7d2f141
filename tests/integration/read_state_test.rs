//! Unread counting and read receipts through the engine.

use std::sync::Arc;

use chorus_core::types::{NotificationId, NotificationKind, UiContext};

use crate::helpers::{RecordingReceipts, TestEngine, note};

#[tokio::test(start_paused = true)]
async fn test_unread_count_drops_by_one_and_mark_is_idempotent() {
    let receipts = Arc::new(RecordingReceipts::default());
    let sink = Arc::clone(&receipts);
    let t = TestEngine::with(UiContext::default(), move |b| b.read_receipts(sink));

    t.engine.refresh(vec![
        note("a", NotificationKind::Like),
        note("b", NotificationKind::Comment),
        note("c", NotificationKind::Follow).with_read(true),
    ]);
    assert_eq!(t.engine.unread_count(), 2);

    assert!(t.engine.mark_as_read(&NotificationId::new("a")).await);
    assert_eq!(t.engine.unread_count(), 1);

    assert!(!t.engine.mark_as_read(&NotificationId::new("a")).await);
    assert_eq!(t.engine.unread_count(), 1);
    assert_eq!(receipts.sent(), vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_persistence_keeps_optimistic_state() {
    let receipts = Arc::new(RecordingReceipts::failing());
    let sink = Arc::clone(&receipts);
    let t = TestEngine::with(UiContext::default(), move |b| b.read_receipts(sink));

    t.engine.refresh(vec![note("a", NotificationKind::Mention)]);
    assert!(t.engine.mark_as_read(&NotificationId::new("a")).await);
    assert_eq!(t.engine.unread_count(), 0);
    assert_eq!(t.engine.metrics().receipts_failed, 1);

    // A later authoritative fetch reconciles.
    t.engine.refresh(vec![note("a", NotificationKind::Mention)]);
    assert_eq!(t.engine.unread_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_mark_all_as_read() {
    let receipts = Arc::new(RecordingReceipts::default());
    let sink = Arc::clone(&receipts);
    let t = TestEngine::with(UiContext::default(), move |b| b.read_receipts(sink));

    t.engine.refresh(vec![
        note("a", NotificationKind::Like),
        note("b", NotificationKind::Badge),
        note("c", NotificationKind::System).with_read(true),
    ]);

    assert_eq!(t.engine.mark_all_as_read().await, 2);
    assert_eq!(t.engine.unread_count(), 0);
    let mut sent = receipts.sent();
    sent.sort();
    assert_eq!(sent, vec!["a", "b"]);
}
