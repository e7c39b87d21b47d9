//! # Error sink: the single consumer of the event bus.
//!
//! Every fault and lifecycle event ends up here. The sink logs it with `tracing`
//! at a level picked by its kind, then fans it out to the user subscribers.
//!
//! ```text
//! Bus rx ──► drain() ──► log(&Event)            (tracing)
//!                   └──► SubscriberSet::emit()  (non-blocking)
//! stop.cancelled() ──► try_recv() the remainder ──► SubscriberSet::shutdown()
//! ```

use tokio::select;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::events::{Event, EventKind};
use crate::subscribers::SubscriberSet;

/// Consumes events until `stop` fires, then flushes what is already queued.
pub(crate) async fn drain(
    mut rx: mpsc::UnboundedReceiver<Event>,
    subscribers: SubscriberSet,
    stop: CancellationToken,
) {
    loop {
        select! {
            ev = rx.recv() => match ev {
                Some(ev) => deliver(&ev, &subscribers),
                None => break,
            },
            _ = stop.cancelled() => {
                while let Ok(ev) = rx.try_recv() {
                    deliver(&ev, &subscribers);
                }
                break;
            }
        }
    }
    subscribers.shutdown().await;
}

fn deliver(ev: &Event, subscribers: &SubscriberSet) {
    log(ev);
    subscribers.emit(ev);
}

fn log(ev: &Event) {
    let reason = ev.reason.as_deref().unwrap_or("");
    match ev.kind {
        EventKind::DialFailed => {
            tracing::error!(attempt = ev.attempt, delay_ms = ev.delay_ms, reason, "dial failed")
        }
        EventKind::ReadFailed => tracing::error!(reason, "read failed"),
        EventKind::WriteFailed => tracing::error!(reason, "write failed"),
        EventKind::CloseFailed => tracing::error!(reason, "close frame failed"),
        EventKind::DialExhausted => {
            tracing::warn!(attempts = ev.attempt, reason, "dial budget exhausted")
        }
        EventKind::LivenessExpired => {
            tracing::warn!(missed = ev.attempt, reason, "liveness expired")
        }
        EventKind::CloseTimedOut => {
            tracing::warn!(timeout_ms = ev.timeout_ms, "no close acknowledgment")
        }
        EventKind::Connected => tracing::info!(attempt = ev.attempt, "connected"),
        EventKind::PeerClosed => tracing::info!(reason, "peer closed"),
        EventKind::InterruptReceived => tracing::info!("interrupt received"),
        EventKind::TerminationRequested => tracing::info!(reason, "termination requested"),
        EventKind::Connecting => tracing::debug!(attempt = ev.attempt, "connecting"),
        EventKind::CloseSent => tracing::debug!(timeout_ms = ev.timeout_ms, "close frame sent"),
        EventKind::ReceiveDone => tracing::debug!("receive loop finished"),
        EventKind::ConnectionClosed => tracing::debug!("connection released"),
    }
}
