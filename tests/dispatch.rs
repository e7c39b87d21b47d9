mod common;

use std::time::Duration;

use bytes::Bytes;
use common::{MockTransport, Recorder, config, interrupt};
use tokio::sync::mpsc;
use wsvisor::{ConnectionStatus, EventKind, FrameKind, Session, Supervisor, TransportError};

#[tokio::test(start_paused = true)]
async fn test_handler_sees_arrival_order() {
    let transport = MockTransport::new();
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<Bytes>();
    let sup = Supervisor::builder(config(&[]), transport.clone())
        .with_handler_fn(move |_session: Session<MockTransport>, payload| {
            let tx = seen_tx.clone();
            async move {
                let _ = tx.send(payload);
            }
        })
        .with_interrupt(std::future::pending())
        .build()
        .unwrap();
    let run = tokio::spawn(sup.run());

    let peer = transport.wait_peer(0).await;
    for text in ["a", "b", "c"] {
        peer.push_text(text);
    }

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(seen_rx.recv().await.unwrap());
    }
    assert_eq!(seen, vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]);

    peer.push_close(1000, "");
    run.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_read_error_does_not_stop_receiving() {
    let transport = MockTransport::new();
    let recorder = Recorder::new();
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<Bytes>();
    let sup = Supervisor::builder(config(&[]), transport.clone())
        .with_handler_fn(move |_session: Session<MockTransport>, payload| {
            let tx = seen_tx.clone();
            async move {
                let _ = tx.send(payload);
            }
        })
        .with_subscribers(recorder.subscribers())
        .with_interrupt(std::future::pending())
        .build()
        .unwrap();
    let run = tokio::spawn(sup.run());

    let peer = transport.wait_peer(0).await;
    peer.push_error(TransportError::Receive {
        error: "bad frame".into(),
    });
    peer.push_text("after");

    assert_eq!(seen_rx.recv().await, Some(Bytes::from("after")));
    assert!(!run.is_finished());

    peer.push_close(1000, "");
    run.await.unwrap().unwrap();
    assert_eq!(recorder.count(EventKind::ReadFailed), 1);
    assert_eq!(transport.dials(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_read_error_without_reconnect_keeps_link_online() {
    let transport = MockTransport::new();
    transport.set_auto_pong(true);
    let recorder = Recorder::new();
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<Bytes>();
    let (stop, on_stop) = interrupt();
    let sup = Supervisor::builder(config(&[("EXPIRE_TIME", "3")]), transport.clone())
        .with_handler_fn(move |_session: Session<MockTransport>, payload| {
            let tx = seen_tx.clone();
            async move {
                let _ = tx.send(payload);
            }
        })
        .with_subscribers(recorder.subscribers())
        .with_interrupt(on_stop)
        .build()
        .unwrap();
    let session = sup.session();
    let run = tokio::spawn(sup.run());

    let peer = transport.wait_peer(0).await;
    peer.push_error(TransportError::Receive {
        error: "bad frame".into(),
    });
    peer.push_text("after");
    assert_eq!(seen_rx.recv().await, Some(Bytes::from("after")));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(session.status(), ConnectionStatus::Online);

    let before = peer.sent_of(FrameKind::Ping).len();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(peer.sent_of(FrameKind::Ping).len() >= before + 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!run.is_finished());
    assert_eq!(recorder.count(EventKind::LivenessExpired), 0);

    let _ = stop.send(());
    run.await.unwrap().unwrap();
    assert_eq!(peer.sent_of(FrameKind::Close).len(), 1);
    assert_eq!(recorder.count(EventKind::ReadFailed), 1);
    assert_eq!(transport.dials(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_handler_replies_through_session() {
    let transport = MockTransport::new();
    let sup = Supervisor::builder(config(&[]), transport.clone())
        .with_handler_fn(|session: Session<MockTransport>, payload: Bytes| async move {
            let reply = format!("echo:{}", String::from_utf8_lossy(&payload));
            session.send_text(reply).await.unwrap();
        })
        .with_interrupt(std::future::pending())
        .build()
        .unwrap();
    let session = sup.session();
    let run = tokio::spawn(sup.run());

    let peer = transport.wait_peer(0).await;
    peer.push_text("hi");
    while peer.sent_of(FrameKind::Text).is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(peer.sent_of(FrameKind::Text)[0].payload, Bytes::from("echo:hi"));

    session.request_shutdown();
    run.await.unwrap().unwrap();
    assert!(session.send_text("late").await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_set_message_handler_replaces_default() {
    let transport = MockTransport::new();
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<Bytes>();
    let mut sup = Supervisor::new(config(&[]), transport.clone()).unwrap();
    sup.set_message_handler_fn(move |_session, payload| {
        let tx = seen_tx.clone();
        async move {
            let _ = tx.send(payload);
        }
    });
    let run = tokio::spawn(async move {
        tokio::select! {
            res = sup.run() => res,
            _ = tokio::time::sleep(Duration::from_secs(60)) => panic!("session did not end"),
        }
    });

    let peer = transport.wait_peer(0).await;
    peer.push_text("x");
    assert_eq!(seen_rx.recv().await, Some(Bytes::from("x")));
    peer.push_close(1000, "");
    run.await.unwrap().unwrap();
}
