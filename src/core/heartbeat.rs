//! # Heartbeat: ping emitter and liveness expiry.
//!
//! Two timer-driven activities share nothing but the pulse channel:
//!
//! ```text
//! ping_loop    every ping_interval: Online? ─► send(Ping "ping")
//!                                              └─ Err ─► Offline + WriteFailed
//!
//! conn pong ─► liveness callback ─► pulse_tx.try_send(())   (bounded(1), lossy)
//!                                          │
//! expiry_loop  every expiry_tick:   drain pulse_rx ─► ExpiryAccumulator::tick(pulsed)
//!                                                     └─ Expired ─► Offline
//!                                                                   + LivenessExpired
//!                                                                   + request_termination
//! ```
//!
//! A pulse is a level, not a count: several pongs within one tick reset the
//! accumulator once.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{shared::Shared, status::ConnectionStatus},
    events::{Event, EventKind},
    transport::{Connection, Frame, Transport},
};

/// Payload of every outbound ping.
pub(crate) const PING_PAYLOAD: &[u8] = b"ping";

/// Outcome of one accumulator step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tick {
    /// A pulse arrived; the counter went back to zero.
    Alive,
    /// No pulse; the counter now holds this many missed ticks.
    Waiting(u64),
    /// The window was exceeded for the first time since the last pulse.
    Expired(u64),
}

/// Counts ticks without a liveness pulse.
///
/// Trips once when the count exceeds the window; further misses report
/// `Waiting` until a pulse re-arms it.
#[derive(Debug)]
pub(crate) struct ExpiryAccumulator {
    window: Option<u64>,
    missed: u64,
    tripped: bool,
}

impl ExpiryAccumulator {
    /// `None` disables expiry: the accumulator counts but never trips.
    pub(crate) fn new(window: Option<u64>) -> Self {
        Self {
            window,
            missed: 0,
            tripped: false,
        }
    }

    pub(crate) fn tick(&mut self, pulsed: bool) -> Tick {
        if pulsed {
            self.missed = 0;
            self.tripped = false;
            return Tick::Alive;
        }

        self.missed = self.missed.saturating_add(1);
        match self.window {
            Some(window) if self.missed > window && !self.tripped => {
                self.tripped = true;
                Tick::Expired(self.missed)
            }
            _ => Tick::Waiting(self.missed),
        }
    }
}

fn ticker(period: time::Duration) -> time::Interval {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Sends a ping on the current connection once per interval while online.
pub(crate) async fn ping_loop<T: Transport>(shared: Arc<Shared<T>>, stop: CancellationToken) {
    let mut ticker = ticker(shared.cfg.ping_interval);
    loop {
        select! {
            _ = stop.cancelled() => return,
            _ = ticker.tick() => {}
        }

        if !shared.status.get().is_online() || shared.is_closing() {
            continue;
        }
        let Some(conn) = shared.guard.current() else {
            continue;
        };
        if let Err(err) = conn.send(Frame::ping(Bytes::from_static(PING_PAYLOAD))).await {
            shared.write_failed(&conn, &err);
        }
    }
}

/// Drives the [`ExpiryAccumulator`] from the pulse channel.
pub(crate) async fn expiry_loop<T: Transport>(
    shared: Arc<Shared<T>>,
    mut pulse_rx: mpsc::Receiver<()>,
    stop: CancellationToken,
) {
    let Some(window) = shared.cfg.expiry_window() else {
        return;
    };

    let mut acc = ExpiryAccumulator::new(Some(window));
    let mut ticker = ticker(shared.cfg.expiry_tick);
    loop {
        select! {
            _ = stop.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let mut pulsed = false;
        while pulse_rx.try_recv().is_ok() {
            pulsed = true;
        }

        if let Tick::Expired(missed) = acc.tick(pulsed) {
            shared.status.set(ConnectionStatus::Offline);
            shared.bus.publish(
                Event::new(EventKind::LivenessExpired)
                    .with_attempt(missed)
                    .with_reason(format!("no liveness pulse for {missed} ticks (window {window})")),
            );
            shared.request_termination("liveness expired");
        }
    }
}
