//! # Runtime events emitted by the session activities.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Faults**: dial/read/write/close failures and liveness expiry
//! - **Lifecycle**: connecting, connected, offline, closed
//! - **Shutdown**: interrupt, receive loop finished, termination requested
//!
//! The [`Event`] struct carries metadata such as timestamps, attempt numbers,
//! delays and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Events from one producer reach the sink in production order;
//! nothing is promised across producers.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use wsvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::DialFailed)
//!     .with_reason("connection refused")
//!     .with_attempt(3)
//!     .with_delay(Duration::from_secs(1));
//!
//! assert!(ev.is_fault());
//! assert_eq!(ev.attempt, Some(3));
//! assert_eq!(ev.delay_ms, Some(1000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Faults ===
    /// A dial attempt failed.
    ///
    /// Sets: `attempt`, `reason`, `delay_ms` (backoff before the next dial, if any)
    DialFailed,

    /// The dial budget ran out; no further attempt will be made.
    ///
    /// Sets: `attempt` (total attempts), `reason` (last dial error)
    DialExhausted,

    /// A read on the current connection failed.
    ///
    /// Sets: `reason`
    ReadFailed,

    /// A ping or application write failed; the status went offline.
    ///
    /// Sets: `reason`
    WriteFailed,

    /// No liveness pulse within the expiry window.
    ///
    /// Sets: `attempt` (ticks counted), `reason`
    LivenessExpired,

    /// Sending the close frame during shutdown failed.
    ///
    /// Sets: `reason`
    CloseFailed,

    // === Lifecycle ===
    /// A dial attempt is starting.
    ///
    /// Sets: `attempt`
    Connecting,

    /// A connection was established and the status is online.
    ///
    /// Sets: `attempt`
    Connected,

    /// A close or unclassified frame arrived from the peer.
    ///
    /// Sets: `reason` (close code and text)
    PeerClosed,

    /// The connection handle was released during cleanup.
    ConnectionClosed,

    // === Shutdown ===
    /// The external interrupt was observed.
    InterruptReceived,

    /// The close frame was sent; waiting for the receive loop to finish.
    ///
    /// Sets: `timeout_ms`
    CloseSent,

    /// The receive loop did not finish within the close timeout.
    ///
    /// Sets: `timeout_ms`
    CloseTimedOut,

    /// The receive loop exited for good.
    ReceiveDone,

    /// Process exit requested.
    ///
    /// Sets: `reason` (who asked)
    TerminationRequested,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Attempt or tick count (starting from 1).
    pub attempt: Option<u64>,
    /// Delay before the next attempt in milliseconds.
    pub delay_ms: Option<u32>,
    /// Timeout in milliseconds.
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (errors, close codes, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            attempt: None,
            delay_ms: None,
            timeout_ms: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u64) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(millis(d));
        self
    }

    /// Attaches a timeout (stored as milliseconds, saturating).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// True for the kinds that describe a failure.
    #[inline]
    pub fn is_fault(&self) -> bool {
        matches!(
            self.kind,
            EventKind::DialFailed
                | EventKind::DialExhausted
                | EventKind::ReadFailed
                | EventKind::WriteFailed
                | EventKind::LivenessExpired
                | EventKind::CloseFailed
        )
    }
}

fn millis(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
