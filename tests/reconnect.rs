mod common;

use std::time::Duration;

use common::{MockTransport, Recorder, config, interrupt};
use wsvisor::{ConnectionStatus, EventKind, RuntimeError, Supervisor, TransportError};

async fn wait_online<T: wsvisor::Transport>(session: &wsvisor::Session<T>) {
    while session.status() != ConnectionStatus::Online {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_failed_dials_then_online() {
    let transport = MockTransport::new();
    transport.fail_next(2);
    let recorder = Recorder::new();
    let (stop, on_stop) = interrupt();

    let sup = Supervisor::builder(config(&[("RECONNECT", "YES")]), transport.clone())
        .with_subscribers(recorder.subscribers())
        .with_interrupt(on_stop)
        .build()
        .unwrap();
    let session = sup.session();
    let run = tokio::spawn(sup.run());

    wait_online(&session).await;
    assert_eq!(transport.dials(), 3);
    assert_eq!(transport.peers().len(), 1);

    let _ = stop.send(());
    run.await.unwrap().unwrap();

    assert_eq!(recorder.count(EventKind::DialFailed), 2);
    assert_eq!(recorder.count(EventKind::Connected), 1);
    let delays: Vec<_> = recorder
        .of(EventKind::DialFailed)
        .into_iter()
        .map(|e| e.delay_ms)
        .collect();
    assert_eq!(delays, vec![Some(1000), Some(1000)]);
}

#[tokio::test(start_paused = true)]
async fn test_jitter_spreads_redial_delays() {
    let transport = MockTransport::new();
    transport.fail_next(3);
    let recorder = Recorder::new();
    let (stop, on_stop) = interrupt();

    let sup = Supervisor::builder(
        config(&[("RECONNECT", "YES"), ("JITTER", "full")]),
        transport.clone(),
    )
    .with_subscribers(recorder.subscribers())
    .with_interrupt(on_stop)
    .build()
    .unwrap();
    let session = sup.session();
    let run = tokio::spawn(sup.run());

    wait_online(&session).await;
    let _ = stop.send(());
    run.await.unwrap().unwrap();

    let delays: Vec<u32> = recorder
        .of(EventKind::DialFailed)
        .into_iter()
        .filter_map(|e| e.delay_ms)
        .collect();
    assert_eq!(delays.len(), 3);
    assert!(delays.iter().all(|ms| *ms <= 1000), "{delays:?}");
    assert_eq!(transport.dials(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_dial_budget_is_enforced() {
    let transport = MockTransport::new();
    transport.fail_next(100);

    let sup = Supervisor::builder(
        config(&[("RECONNECT", "y"), ("EXPIRE_TIME", "0"), ("DIAL_ATTEMPTS", "2")]),
        transport.clone(),
    )
    .with_interrupt(std::future::pending())
    .build()
    .unwrap();

    let err = sup.run().await.unwrap_err();
    match err {
        RuntimeError::DialExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(last.as_label(), "transport_dial");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(transport.dials(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_bounds_each_dial() {
    let transport = MockTransport::new();
    transport.set_dial_delay(Duration::from_secs(10));
    let mut cfg = config(&[("RECONNECT", "YES"), ("DIAL_ATTEMPTS", "1")]);
    cfg.connect_timeout = Some(Duration::from_secs(2));

    let sup = Supervisor::builder(cfg, transport.clone())
        .with_interrupt(std::future::pending())
        .build()
        .unwrap();

    let started = tokio::time::Instant::now();
    let err = sup.run().await.unwrap_err();
    match err {
        RuntimeError::DialExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 2);
            assert_eq!(last.as_label(), "transport_timeout");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(transport.dials(), 2);
    assert!(transport.peers().is_empty());
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_expire_time_doubles_as_dial_budget() {
    let transport = MockTransport::new();
    transport.fail_next(100);

    let sup = Supervisor::builder(config(&[("RECONNECT", "YES"), ("EXPIRE_TIME", "4")]), transport.clone())
        .with_interrupt(std::future::pending())
        .build()
        .unwrap();

    let err = sup.run().await.unwrap_err();
    assert_eq!(err.as_label(), "runtime_dial_exhausted");
    assert_eq!(transport.dials(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_disabled_does_not_retry() {
    let transport = MockTransport::new();
    transport.fail_next(1);

    let sup = Supervisor::builder(config(&[("RECONNECT", "NO")]), transport.clone())
        .with_interrupt(std::future::pending())
        .build()
        .unwrap();

    let err = sup.run().await.unwrap_err();
    assert!(matches!(err, RuntimeError::DialExhausted { attempts: 1, .. }));
    assert_eq!(transport.dials(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_triggers_reconnect() {
    let transport = MockTransport::new();
    let recorder = Recorder::new();
    let (stop, on_stop) = interrupt();

    let sup = Supervisor::builder(config(&[("RECONNECT", "YES")]), transport.clone())
        .with_subscribers(recorder.subscribers())
        .with_interrupt(on_stop)
        .build()
        .unwrap();
    let session = sup.session();
    let run = tokio::spawn(sup.run());

    let first = transport.wait_peer(0).await;
    first.set_fail_sends(true);

    let second = transport.wait_peer(1).await;
    wait_online(&session).await;
    assert_eq!(transport.dials(), 2);
    assert!(session.connection().is_some());

    let _ = stop.send(());
    run.await.unwrap().unwrap();

    assert!(recorder.count(EventKind::WriteFailed) >= 1);
    assert_eq!(second.close_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_triggers_dial_one_at_a_time() {
    let transport = MockTransport::new();
    transport.set_dial_delay(Duration::from_millis(300));
    let (stop, on_stop) = interrupt();

    let sup = Supervisor::builder(config(&[("RECONNECT", "YES")]), transport.clone())
        .with_interrupt(on_stop)
        .build()
        .unwrap();
    let session = sup.session();
    let run = tokio::spawn(sup.run());

    let peer = transport.wait_peer(0).await;
    wait_online(&session).await;

    // Read failure, write failure and an application send all at once.
    peer.set_fail_sends(true);
    peer.push_error(TransportError::Receive {
        error: "reset by peer".into(),
    });
    let _ = session.send_text("hello").await;

    transport.wait_peer(1).await;
    wait_online(&session).await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(transport.max_in_flight(), 1);
    assert_eq!(transport.dials(), 2);

    let _ = stop.send(());
    run.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_peer_close_with_reconnect_dials_again() {
    let transport = MockTransport::new();
    let (stop, on_stop) = interrupt();

    let sup = Supervisor::builder(config(&[("RECONNECT", "YES")]), transport.clone())
        .with_interrupt(on_stop)
        .build()
        .unwrap();
    let session = sup.session();
    let run = tokio::spawn(sup.run());

    let first = transport.wait_peer(0).await;
    first.push_close(4000, "restart");

    transport.wait_peer(1).await;
    wait_online(&session).await;
    assert!(!run.is_finished());

    let _ = stop.send(());
    run.await.unwrap().unwrap();
}
