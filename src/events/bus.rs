//! # Fault and lifecycle bus.
//!
//! [`Bus`] is a thin wrapper around an unbounded [`tokio::sync::mpsc`] channel.
//! Every activity holds a clone and publishes without blocking; the error sink
//! owns the only receiver.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Consumer (one):
//!   Reconnector ──┐
//!   Heartbeat   ──┤
//!   Router      ──┼──────► Bus ───────► core::sink (tracing + SubscriberSet)
//!   Shutdown    ──┤   (unbounded mpsc)
//!   Session     ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits.
//! - **Unbounded**: nothing is dropped while the sink is alive.
//! - **Per-producer FIFO**: no ordering across producers (use `Event::seq`).
//! - **Closed sink**: events published after the sink stopped are discarded.

use tokio::sync::mpsc;

use super::event::Event;

/// Multi-producer handle onto the fault/lifecycle channel.
///
/// Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: mpsc::UnboundedSender<Event>,
}

impl Bus {
    /// Creates the bus and the receiver for its single consumer.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publishes an event; dropped silently if the consumer is gone.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_per_producer_order_is_kept() {
        let (bus, mut rx) = Bus::channel();
        let other = bus.clone();

        bus.publish(Event::new(EventKind::DialFailed).with_attempt(1));
        other.publish(Event::new(EventKind::ReadFailed));
        bus.publish(Event::new(EventKind::DialFailed).with_attempt(2));
        drop(bus);
        drop(other);

        let mut dial_attempts = Vec::new();
        while let Some(ev) = rx.recv().await {
            if ev.kind == EventKind::DialFailed {
                dial_attempts.extend(ev.attempt);
            }
        }
        assert_eq!(dial_attempts, vec![1, 2]);
    }
}
