//! Delivery queue ordering, pacing and cancellation.

use std::time::Duration;

use chorus_core::types::{NotificationId, NotificationKind};

use crate::helpers::{DeliveryLog, advance, note, queue};

#[tokio::test(start_paused = true)]
async fn test_same_id_enqueued_twice_is_queued_once() {
    let q = queue();
    q.enqueue(note("n1", NotificationKind::Like), 3);
    q.enqueue(note("n1", NotificationKind::Like), 3);
    assert_eq!(q.len(), 1);

    let log = DeliveryLog::default();
    let _sub = log.attach_queue(&q);
    advance(10_000).await;
    assert_eq!(log.ids(), vec!["n1"]);
}

#[tokio::test(start_paused = true)]
async fn test_drains_by_priority() {
    let q = queue();
    let log = DeliveryLog::default();
    let _sub = log.attach_queue(&q);

    q.enqueue(note("p3", NotificationKind::Like), 3);
    q.enqueue(note("p9", NotificationKind::Mention), 9);
    q.enqueue(note("p1", NotificationKind::Unknown), 1);

    advance(10_000).await;
    assert_eq!(log.ids(), vec!["p9", "p3", "p1"]);
}

#[tokio::test(start_paused = true)]
async fn test_equal_priority_earlier_first() {
    let q = queue();
    let log = DeliveryLog::default();
    let _sub = log.attach_queue(&q);

    q.enqueue(note("blocker", NotificationKind::Message), 10);
    advance(10).await;
    q.enqueue(note("first", NotificationKind::Comment), 4);
    advance(10).await;
    q.enqueue(note("second", NotificationKind::Comment), 4);

    advance(10_000).await;
    assert_eq!(log.ids(), vec!["blocker", "first", "second"]);
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_deliveries_at_least_two_seconds_apart() {
    let q = queue();
    let log = DeliveryLog::default();
    let _sub = log.attach_queue(&q);

    for i in 0..4 {
        q.enqueue(note(&format!("n{i}"), NotificationKind::Like), 3);
    }
    advance(20_000).await;

    let entries = log.entries();
    assert_eq!(entries.len(), 4);
    for pair in entries.windows(2) {
        assert!(pair[1].at.duration_since(pair[0].at) >= Duration::from_millis(2_000));
    }
}

#[tokio::test(start_paused = true)]
async fn test_removed_item_is_never_delivered() {
    let q = queue();
    let log = DeliveryLog::default();
    let _sub = log.attach_queue(&q);

    q.enqueue(note("a", NotificationKind::Follow), 2);
    q.enqueue(note("b", NotificationKind::Follow), 2);
    q.enqueue(note("c", NotificationKind::Follow), 2);
    assert_eq!(q.len(), 3);

    assert!(q.remove(&NotificationId::new("b")));
    assert_eq!(q.len(), 2);

    advance(10_000).await;
    assert_eq!(log.ids(), vec!["a", "c"]);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_item_cannot_be_removed() {
    let q = queue();
    let log = DeliveryLog::default();
    let _sub = log.attach_queue(&q);

    q.enqueue(note("a", NotificationKind::Badge), 7);
    advance(1).await;
    assert!(!q.remove(&NotificationId::new("a")));
    assert_eq!(log.ids(), vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn test_item_waiting_out_interval_stays_removable() {
    let q = queue();
    let log = DeliveryLog::default();
    let _sub = log.attach_queue(&q);

    q.enqueue(note("a", NotificationKind::Like), 3);
    q.enqueue(note("b", NotificationKind::Like), 3);
    advance(600).await;
    assert_eq!(log.ids(), vec!["a"]);
    assert_eq!(q.len(), 1);

    assert!(q.remove(&NotificationId::new("b")));
    advance(10_000).await;
    assert_eq!(log.ids(), vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn test_mention_then_like_end_to_end() {
    let q = queue();
    let log = DeliveryLog::default();
    let _sub = log.attach_queue(&q);
    let start = tokio::time::Instant::now();

    q.enqueue(note("n1", NotificationKind::Mention), 9);
    advance(100).await;
    q.enqueue(note("n2", NotificationKind::Like), 3);
    advance(10_000).await;

    let entries = log.entries();
    assert_eq!(log.ids(), vec!["n1", "n2"]);
    assert_eq!(entries[0].at, start);
    assert!(entries[1].at.duration_since(entries[0].at) >= Duration::from_millis(2_000));
}

#[tokio::test(start_paused = true)]
async fn test_late_high_priority_overtakes_waiting_items() {
    let q = queue();
    let log = DeliveryLog::default();
    let _sub = log.attach_queue(&q);

    q.enqueue(note("low-1", NotificationKind::Like), 3);
    q.enqueue(note("low-2", NotificationKind::Like), 3);
    advance(100).await;
    q.enqueue(note("urgent", NotificationKind::Message), 10);

    advance(10_000).await;
    assert_eq!(log.ids(), vec!["low-1", "urgent", "low-2"]);
}

#[tokio::test(start_paused = true)]
async fn test_drain_restarts_after_queue_empties() {
    let q = queue();
    let log = DeliveryLog::default();
    let _sub = log.attach_queue(&q);

    q.enqueue(note("a", NotificationKind::System), 6);
    advance(5_000).await;
    assert!(!q.is_processing());

    q.enqueue(note("b", NotificationKind::System), 6);
    advance(5_000).await;
    assert_eq!(log.ids(), vec!["a", "b"]);
}

#[tokio::test(start_paused = true)]
async fn test_clear_drops_pending_only() {
    let q = queue();
    let log = DeliveryLog::default();
    let _sub = log.attach_queue(&q);

    q.enqueue(note("a", NotificationKind::Comment), 4);
    q.enqueue(note("b", NotificationKind::Comment), 4);
    advance(1).await;
    q.clear();
    assert!(q.is_empty());

    advance(10_000).await;
    assert_eq!(log.ids(), vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_subscription_stops_deliveries() {
    let q = queue();
    let log = DeliveryLog::default();
    let sub = log.attach_queue(&q);

    q.enqueue(note("a", NotificationKind::Like), 3);
    q.enqueue(note("b", NotificationKind::Like), 3);
    advance(1).await;
    sub.unsubscribe();

    advance(10_000).await;
    assert_eq!(log.ids(), vec!["a"]);
    assert!(q.is_empty());
}
