//! End-to-end pipeline over the in-memory source.

use chorus_core::traits::SourceCommand;
use chorus_core::types::{NotificationId, UiContext};

use crate::helpers::{TestEngine, advance, frame};

#[tokio::test(start_paused = true)]
async fn test_connect_subscribes_twice() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    assert!(t.engine.start().await.expect("start"));
    let mut peer = t.controller.accept().await.expect("peer");
    assert_eq!(peer.token(), "test-token");

    assert_eq!(peer.next_command().await, Some(SourceCommand::Subscribe));
    assert!(t.engine.is_connected());
    assert_eq!(peer.try_command(), None);

    advance(1_100).await;
    assert_eq!(peer.try_command(), Some(SourceCommand::Subscribe));
}

#[tokio::test(start_paused = true)]
async fn test_burst_is_delivered_by_priority_with_feedback() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    t.engine.start().await.expect("start");
    let peer = t.controller.accept().await.expect("peer");

    peer.push_frame(&frame("like-1", "like", Some("/posts/1")), None).await.expect("push");
    peer.push_frame(&frame("mention-1", "mention", Some("/posts/2")), None).await.expect("push");
    peer.push_frame(&frame("msg-1", "message", Some("/chat/c9")), None).await.expect("push");

    advance(10_000).await;
    assert_eq!(t.log.ids(), vec!["msg-1", "mention-1", "like-1"]);
    assert_eq!(t.speaker.count(), 3);
    assert_eq!(t.engine.unread_count(), 3);

    let held: Vec<String> = t.engine.notifications().iter().map(|n| n.id.to_string()).collect();
    assert_eq!(held, vec!["msg-1", "mention-1", "like-1"]);
}

#[tokio::test(start_paused = true)]
async fn test_suppressed_notification_counts_as_unread() {
    let mut t = TestEngine::new(UiContext::on_path("/feed").with_conversation("abc123"));
    t.engine.start().await.expect("start");
    let peer = t.controller.accept().await.expect("peer");

    peer.push_frame(&frame("n1", "message", Some("/chat/abc123")), None).await.expect("push");
    peer.push_frame(&frame("n2", "group_invite", Some("/feed?tab=new")), None).await.expect("push");

    advance(10_000).await;
    assert!(t.log.ids().is_empty());
    assert_eq!(t.speaker.count(), 0);
    assert_eq!(t.engine.unread_count(), 2);
    assert_eq!(t.metrics.snapshot().suppressed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_opening_conversation_cancels_queued_message() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    t.engine.start().await.expect("start");
    let peer = t.controller.accept().await.expect("peer");

    peer.push_frame(&frame("first", "message", Some("/chat/other")), None).await.expect("push");
    peer.push_frame(&frame("chat", "message", Some("/chat/xyz")), None).await.expect("push");
    advance(100).await;
    assert_eq!(t.log.ids(), vec!["first"]);

    t.engine
        .update_context(|ctx| ctx.active_conversation_id = Some("xyz".into()));
    assert_eq!(t.engine.pending_count(), 0);

    advance(10_000).await;
    assert_eq!(t.log.ids(), vec!["first"]);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_after_delivery_is_not_surfaced_again() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    t.engine.start().await.expect("start");
    let peer = t.controller.accept().await.expect("peer");

    peer.push_frame(&frame("n1", "badge", None), None).await.expect("push");
    advance(5_000).await;
    peer.push_frame(&frame("n1", "badge", None), None).await.expect("push");
    advance(5_000).await;

    assert_eq!(t.log.ids(), vec!["n1"]);
    assert_eq!(t.metrics.snapshot().duplicates_dropped, 1);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frames_are_dropped() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    t.engine.start().await.expect("start");
    let peer = t.controller.accept().await.expect("peer");

    let no_id = r#"{"type":"new_notification","notification":{"type":"like","title":"x"}}"#;
    peer.push_frame(no_id, Some(t.metrics.as_ref())).await.expect("push");
    peer.push_frame("{broken", Some(t.metrics.as_ref())).await.expect("push");
    peer.push_frame(&frame("ok", "future_kind", None), Some(t.metrics.as_ref()))
        .await
        .expect("push");

    advance(5_000).await;
    assert_eq!(t.log.ids(), vec!["ok"]);
    assert_eq!(t.metrics.snapshot().events_malformed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_read_receipt_and_server_confirmation_over_socket() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    t.engine.start().await.expect("start");
    let mut peer = t.controller.accept().await.expect("peer");

    peer.push_frame(&frame("a", "comment", None), None).await.expect("push");
    peer.push_frame(&frame("b", "comment", None), None).await.expect("push");
    advance(5_000).await;
    while peer.try_command().is_some() {}

    assert!(t.engine.mark_as_read(&NotificationId::new("a")).await);
    assert_eq!(
        peer.next_command().await,
        Some(SourceCommand::MarkRead(NotificationId::new("a")))
    );

    peer.confirm_read("b").await.expect("confirm");
    advance(10).await;
    assert_eq!(t.engine.unread_count(), 0);
    assert_eq!(peer.try_command(), None);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_clears_connected_flag() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    t.engine.start().await.expect("start");
    let peer = t.controller.accept().await.expect("peer");
    advance(10).await;
    assert!(t.engine.is_connected());

    peer.disconnect(Some("server restart")).await.expect("disconnect");
    advance(10).await;
    assert!(!t.engine.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_refused_connection_is_reported_not_fatal() {
    let t = TestEngine::new(UiContext::on_path("/feed"));
    t.controller.refuse_connections(true);

    assert!(t.engine.start().await.is_err());
    assert!(!t.engine.is_connected());

    t.controller.refuse_connections(false);
    assert!(t.engine.start().await.expect("retry"));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_detaches_and_drops_pending() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    t.engine.start().await.expect("start");
    let peer = t.controller.accept().await.expect("peer");

    peer.push_frame(&frame("a", "like", None), None).await.expect("push");
    peer.push_frame(&frame("b", "like", None), None).await.expect("push");
    advance(100).await;
    assert_eq!(t.log.ids(), vec!["a"]);

    t.engine.shutdown();
    assert!(!t.engine.is_connected());
    assert_eq!(t.engine.pending_count(), 0);

    advance(10_000).await;
    assert_eq!(t.log.ids(), vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn test_marking_queued_notification_read_cancels_its_delivery() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    t.engine.start().await.expect("start");
    let peer = t.controller.accept().await.expect("peer");

    peer.push_frame(&frame("a", "comment", None), None).await.expect("push");
    peer.push_frame(&frame("b", "comment", None), None).await.expect("push");
    advance(10).await;
    assert_eq!(t.log.ids(), vec!["a"]);

    assert!(t.engine.mark_as_read(&NotificationId::new("b")).await);
    assert_eq!(t.engine.pending_count(), 0);

    advance(10_000).await;
    assert_eq!(t.log.ids(), vec!["a"]);
    assert_eq!(t.speaker.count(), 1);
    assert_eq!(t.engine.unread_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_mark_all_read_cancels_pending_deliveries() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    t.engine.start().await.expect("start");
    let peer = t.controller.accept().await.expect("peer");

    for id in ["a", "b", "c"] {
        peer.push_frame(&frame(id, "like", None), None).await.expect("push");
    }
    advance(10).await;
    assert_eq!(t.log.ids(), vec!["a"]);

    assert_eq!(t.engine.mark_all_as_read().await, 3);
    assert_eq!(t.engine.pending_count(), 0);

    advance(10_000).await;
    assert_eq!(t.log.ids(), vec!["a"]);
    assert_eq!(t.engine.unread_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_server_confirmed_read_cancels_pending_delivery() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    t.engine.start().await.expect("start");
    let peer = t.controller.accept().await.expect("peer");

    peer.push_frame(&frame("a", "follow", None), None).await.expect("push");
    peer.push_frame(&frame("b", "follow", None), None).await.expect("push");
    advance(10).await;

    peer.confirm_read("b").await.expect("confirm");
    advance(10_000).await;
    assert_eq!(t.log.ids(), vec!["a"]);
    assert_eq!(t.engine.unread_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_second_start_reuses_live_connection() {
    let mut t = TestEngine::new(UiContext::on_path("/feed"));
    assert!(t.engine.start().await.expect("start"));
    let peer = t.controller.accept().await.expect("peer");
    advance(10).await;

    assert!(t.engine.start().await.expect("second start"));
    assert_eq!(t.controller.connect_attempts(), 1);

    peer.disconnect(None).await.expect("disconnect");
    advance(10).await;
    assert!(t.engine.start().await.expect("reconnect"));
    assert_eq!(t.controller.connect_attempts(), 2);
}
