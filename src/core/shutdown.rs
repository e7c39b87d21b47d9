//! # Shutdown coordinator and OS interrupt handling.
//!
//! [`wait_for_interrupt`] completes on the standard interrupt signal (Ctrl-C / `SIGINT`).
//! No other signal is handled.
//!
//! The coordinator races three triggers and acts on the first:
//!
//! ```text
//! interrupt ──► InterruptReceived
//!                 └─ Online? ─► Inbound::Interrupt, closing = true
//!                               send Close(1000, "")  ── Err ─► CloseFailed
//!                               CloseSent
//!                               wait receive_done ≤ close_timeout ── elapsed ─► CloseTimedOut
//!               request_termination("interrupt")
//!
//! receive_done ──► request_termination("receive loop finished")
//!
//! exit (someone else asked) ──► return
//! ```

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time;

use crate::{
    core::{router::Inbound, shared::Shared},
    error::TransportError,
    events::{Event, EventKind},
    transport::{CLOSE_NORMAL, Connection, Frame, Transport},
};

/// Waits for the process interrupt signal.
///
/// Each call registers its own listener.
///
/// Returns `Err` if the listener cannot be registered.
#[cfg(unix)]
pub async fn wait_for_interrupt() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    sigint.recv().await;
    Ok(())
}

/// Waits for the process interrupt signal.
///
/// Each call registers its own listener.
///
/// Returns `Err` if the listener cannot be registered.
#[cfg(not(unix))]
pub async fn wait_for_interrupt() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Runs until one trigger fires; always leaves the termination signal raised.
pub(crate) async fn coordinate<T: Transport>(
    shared: Arc<Shared<T>>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    interrupt: BoxFuture<'static, ()>,
) {
    select! {
        _ = interrupt => {
            shared.bus.publish(Event::new(EventKind::InterruptReceived));
            close_handshake(&shared, &inbound_tx).await;
            shared.request_termination("interrupt");
        }
        _ = shared.receive_done.cancelled() => {
            shared.request_termination("receive loop finished");
        }
        _ = shared.exit.cancelled() => {}
    }
}

async fn close_handshake<T: Transport>(shared: &Shared<T>, inbound_tx: &mpsc::UnboundedSender<Inbound>) {
    if !shared.status.get().is_online() {
        return;
    }
    let Some(conn) = shared.guard.current() else {
        return;
    };

    let _ = inbound_tx.send(Inbound::Interrupt);
    shared.begin_closing();

    let wait = shared.cfg.close_timeout;
    let sent = match time::timeout(wait, conn.send(Frame::close(CLOSE_NORMAL, ""))).await {
        Ok(res) => res,
        Err(_) => Err(TransportError::Timeout { timeout: wait }),
    };
    if let Err(err) = sent {
        shared
            .bus
            .publish(Event::new(EventKind::CloseFailed).with_reason(err.as_message()));
        return;
    }

    shared
        .bus
        .publish(Event::new(EventKind::CloseSent).with_timeout(wait));
    if time::timeout(wait, shared.receive_done.cancelled()).await.is_err() {
        shared
            .bus
            .publish(Event::new(EventKind::CloseTimedOut).with_timeout(wait));
    }
}
