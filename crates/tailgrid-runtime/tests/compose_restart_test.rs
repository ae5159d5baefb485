#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use tailgrid_core::{PaneId, RunState};
use tailgrid_runtime::cache::CachedRuntime;
use tailgrid_runtime::mock::{test_container, MockRuntime, MockStream};
use tailgrid_runtime::reconnect::{reconnect, should_reconnect, ReconnectEvent, DEFAULT_SCHEDULE};
use tailgrid_runtime::runtime::ContainerRuntime;
use tailgrid_runtime::session::{SessionEvent, StreamSession};
use tailgrid_runtime::types::LogRequest;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const FOLLOW: LogRequest = LogRequest {
    follow: true,
    tail: Some(100),
};

async fn next_event(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("event before timeout")
        .expect("channel open")
}

#[tokio::test(start_paused = true)]
async fn compose_restart_resumes_pane_under_new_container_id() {
    let old = test_container("old0000", "shop-api-1", "shop", "api");
    let mock = Arc::new(
        MockRuntime::new()
            .with_stream(
                "old0000",
                MockStream::multiplexed().stdout("2024-05-01T10:00:00.000000000Z shutting down"),
            )
            .with_stream(
                "new1111",
                MockStream::multiplexed()
                    .stdout("2024-05-01T10:00:05.000000000Z listening on :8080")
                    .hold_open(),
            ),
    );
    let runtime: Arc<dyn ContainerRuntime> = mock.clone();
    let root = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel::<SessionEvent>(16);
    let pane = PaneId(0);

    let first = StreamSession::spawn(Arc::clone(&runtime), pane, old.clone(), FOLLOW, &root, tx.clone());
    match next_event(&mut rx).await {
        SessionEvent::Line { line, session, .. } => {
            assert_eq!(session, first.id());
            assert_eq!(line.content, "shutting down");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(next_event(&mut rx).await, SessionEvent::Closed { .. }));
    assert!(should_reconnect(&old, true));

    // The service comes back under a new id while the supervisor waits.
    mock.set_containers(vec![test_container("new1111", "shop-api-2", "shop", "api")]);
    let event = reconnect(runtime.as_ref(), pane, &old, &DEFAULT_SCHEDULE, &root)
        .await
        .expect("not cancelled");
    let ReconnectEvent::Reconnected { container, attempt, .. } = event else {
        panic!("expected reconnection, got {event:?}");
    };
    assert_eq!(container.id, "new1111");
    assert_eq!(attempt, 1);

    let second = StreamSession::spawn(runtime, pane, container, FOLLOW, &root, tx);
    assert_ne!(second.id(), first.id());
    match next_event(&mut rx).await {
        SessionEvent::Line { line, session, .. } => {
            assert_eq!(session, second.id());
            assert_eq!(line.content, "listening on :8080");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(mock.open_count("new1111"), 1);

    root.cancel();
}

#[tokio::test(start_paused = true)]
async fn compose_restart_through_the_listing_cache_adopts_the_new_container() {
    let old = test_container("old0000", "shop-api-1", "shop", "api");
    let mock = Arc::new(
        MockRuntime::new()
            .with_container(old.clone())
            .with_stream("old0000", MockStream::multiplexed().stdout("bye"))
            .with_stream("new1111", MockStream::multiplexed().stdout("hello").hold_open()),
    );
    // Wired the way the binary wires it: a long-lived cached listing.
    let runtime: Arc<dyn ContainerRuntime> =
        Arc::new(CachedRuntime::new(mock.clone(), Duration::from_secs(3600)));
    assert_eq!(runtime.list_containers().await.unwrap().len(), 1);

    let root = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel::<SessionEvent>(16);
    let pane = PaneId(3);
    let _first = StreamSession::spawn(Arc::clone(&runtime), pane, old.clone(), FOLLOW, &root, tx.clone());
    assert!(matches!(next_event(&mut rx).await, SessionEvent::Line { .. }));
    assert!(matches!(next_event(&mut rx).await, SessionEvent::Closed { .. }));

    let mut exited = old.clone();
    exited.state = RunState::Exited;
    mock.set_containers(vec![exited, test_container("new1111", "shop-api-2", "shop", "api")]);

    let event = reconnect(runtime.as_ref(), pane, &old, &DEFAULT_SCHEDULE, &root)
        .await
        .expect("not cancelled");
    let ReconnectEvent::Reconnected { container, attempt, .. } = event else {
        panic!("expected reconnection, got {event:?}");
    };
    assert_eq!(container.id, "new1111");
    assert_eq!(attempt, 1);

    let _second = StreamSession::spawn(runtime, pane, container, FOLLOW, &root, tx);
    match next_event(&mut rx).await {
        SessionEvent::Line { line, .. } => assert_eq!(line.content, "hello"),
        other => panic!("unexpected {other:?}"),
    }
    root.cancel();
}
