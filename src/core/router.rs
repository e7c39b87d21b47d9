//! # Message router: receive loop and dispatcher.
//!
//! ```text
//! receive_loop ── conn.receive() ──► Inbound::Message(payload) ──► inbound queue (unbounded, FIFO)
//!      │                                                                  │
//!      │  Close/Unknown frame:                                            ▼
//!      │    forward payload, then                              dispatch_loop
//!      │    ├─ reconnect disabled or closing → stop              ├─ Message   → handler.on_message
//!      │    └─ otherwise                     → Offline           └─ Interrupt → handler.on_interrupt
//!      │  Read error:
//!      │    sleep(read_retry_delay), ReadFailed
//!      │    └─ reconnect enabled → Offline (current handle only)
//!      ▼
//! on exit: receive_done.cancel() + ReceiveDone
//! ```
//!
//! With reconnect enabled a pending read is dropped as soon as the status goes
//! offline, so a half-dead handle never pins the loop after it was replaced.
//!
//! A read error never ends the loop; only a terminal frame or the exit signal does.
//! Without reconnect nothing could bring the status back, so a read error leaves
//! it Online and the heartbeat keeps judging the link.
//! Without reconnect (or once the local close began), a stream that ended without
//! a close frame counts as terminal.

use std::sync::Arc;

use bytes::Bytes;
use tokio::select;
use tokio::sync::{mpsc, watch};
use tokio::time;

use crate::{
    core::{
        session::Session,
        shared::Shared,
        status::{ConnectionStatus, wait_until},
    },
    error::TransportError,
    events::{Event, EventKind},
    handlers::HandlerRef,
    transport::{Connection, Frame, FrameKind, Transport},
};

/// Item on the inbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Inbound {
    Message(Bytes),
    /// Interrupt marker pushed by the shutdown coordinator.
    Interrupt,
}

enum Step {
    Continue,
    Stop,
}

/// Pulls frames from the current connection until a terminal frame (without
/// reconnect) or the exit signal ends it.
pub(crate) async fn receive_loop<T: Transport>(
    shared: Arc<Shared<T>>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
) {
    let mut status = shared.status.subscribe();

    loop {
        if shared.exit.is_cancelled() {
            break;
        }

        if shared.cfg.reconnect.is_enabled() && !shared.is_closing() {
            let online = select! {
                ok = wait_until(&mut status, ConnectionStatus::is_online) => ok,
                _ = shared.exit.cancelled() => false,
            };
            if !online {
                break;
            }
        }

        let Some(conn) = shared.guard.current() else {
            let idle = select! {
                _ = time::sleep(shared.cfg.read_retry_delay) => true,
                _ = shared.exit.cancelled() => false,
            };
            if idle { continue } else { break }
        };

        let received = select! {
            res = conn.receive() => res,
            _ = abandoned(&shared, &mut status) => continue,
            _ = shared.exit.cancelled() => break,
        };

        let step = match received {
            Ok(frame) => on_frame(&shared, &conn, frame, &inbound_tx),
            Err(TransportError::Closed) if !shared.cfg.reconnect.is_enabled() || shared.is_closing() => {
                shared.bus.publish(
                    Event::new(EventKind::PeerClosed).with_reason("stream ended without close frame"),
                );
                Step::Stop
            }
            Err(err) => {
                select! {
                    _ = time::sleep(shared.cfg.read_retry_delay) => {}
                    _ = shared.exit.cancelled() => break,
                }
                shared
                    .bus
                    .publish(Event::new(EventKind::ReadFailed).with_reason(err.as_message()));
                if shared.cfg.reconnect.is_enabled() && !shared.is_closing() {
                    shared.mark_offline(&conn);
                }
                Step::Continue
            }
        };

        if let Step::Stop = step {
            break;
        }
    }

    shared.receive_done.cancel();
    shared.bus.publish(Event::new(EventKind::ReceiveDone));
}

/// Resolves when the connection being read should be given up for the next one.
///
/// Only with reconnect enabled: an offline status means the handle is being replaced.
async fn abandoned<T: Transport>(shared: &Shared<T>, status: &mut watch::Receiver<ConnectionStatus>) {
    if shared.cfg.reconnect.is_enabled()
        && !shared.is_closing()
        && wait_until(status, |s| !s.is_online()).await
    {
        return;
    }
    std::future::pending::<()>().await
}

fn on_frame<T: Transport>(
    shared: &Shared<T>,
    conn: &Arc<T::Conn>,
    frame: Frame,
    inbound_tx: &mpsc::UnboundedSender<Inbound>,
) -> Step {
    let terminal = frame.is_terminal();
    let reason = match frame.kind {
        FrameKind::Close => Some(match frame.close_code() {
            Some(code) => format!("close code={code} reason={:?}", frame.close_reason()),
            None => "close without status".to_string(),
        }),
        FrameKind::Unknown => Some("unclassified frame".to_string()),
        _ => None,
    };

    let _ = inbound_tx.send(Inbound::Message(frame.payload));

    if !terminal {
        return Step::Continue;
    }

    if let Some(reason) = reason {
        shared
            .bus
            .publish(Event::new(EventKind::PeerClosed).with_reason(reason));
    }

    if !shared.cfg.reconnect.is_enabled() || shared.is_closing() {
        return Step::Stop;
    }
    shared.mark_offline(conn);
    Step::Continue
}

/// Drains the inbound queue into the handler, one payload at a time.
pub(crate) async fn dispatch_loop<T: Transport>(
    session: Session<T>,
    handler: HandlerRef<T>,
    mut inbound_rx: mpsc::UnboundedReceiver<Inbound>,
) {
    while let Some(item) = inbound_rx.recv().await {
        match item {
            Inbound::Message(payload) => handler.on_message(&session, payload).await,
            Inbound::Interrupt => handler.on_interrupt(&session).await,
        }
    }
}
