//! # State shared by every session activity.
//!
//! One [`Shared`] is created per supervisor and handed to each activity as an
//! `Arc`. Activities never touch each other's locals; they meet only here:
//!
//! | Field          | Cardinality                      | Meaning                          |
//! |----------------|----------------------------------|----------------------------------|
//! | `guard`        | writers under mutex, many readers | LiveConnection                  |
//! | `status`       | one writer at a time, many readers | ConnectionStatus               |
//! | `bus`          | many producers, one consumer     | FaultQueue (+ lifecycle events)  |
//! | `pulse_tx`     | one producer, one consumer       | LivenessPulse (best effort)      |
//! | `exit`         | many producers, one consumer     | TerminationSignal                |
//! | `receive_done` | one producer, many observers     | ReceiveDoneSignal                |

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    config::Config,
    core::{
        guard::ConnectionGuard,
        status::{ConnectionStatus, StatusCell},
    },
    error::{RuntimeError, TransportError},
    events::{Bus, Event, EventKind},
    transport::Transport,
};

pub(crate) struct Shared<T: Transport> {
    pub(crate) cfg: Config,
    pub(crate) url: Url,
    pub(crate) transport: T,
    pub(crate) guard: ConnectionGuard<T::Conn>,
    pub(crate) status: StatusCell,
    pub(crate) bus: Bus,
    pub(crate) pulse_tx: mpsc::Sender<()>,
    pub(crate) exit: CancellationToken,
    pub(crate) receive_done: CancellationToken,
    closing: AtomicBool,
    failure: Mutex<Option<RuntimeError>>,
}

impl<T: Transport> Shared<T> {
    pub(crate) fn new(cfg: Config, url: Url, transport: T, bus: Bus, pulse_tx: mpsc::Sender<()>) -> Self {
        Self {
            cfg,
            url,
            transport,
            guard: ConnectionGuard::new(),
            status: StatusCell::new(),
            bus,
            pulse_tx,
            exit: CancellationToken::new(),
            receive_done: CancellationToken::new(),
            closing: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    /// Publishes the termination signal. Repeated requests are absorbed.
    pub(crate) fn request_termination(&self, reason: &str) {
        if self.exit.is_cancelled() {
            return;
        }
        self.bus
            .publish(Event::new(EventKind::TerminationRequested).with_reason(reason));
        self.exit.cancel();
    }

    /// Records a session-ending error and requests termination.
    ///
    /// Only the first error is kept; [`Supervisor::run`](crate::Supervisor::run) returns it.
    pub(crate) fn fail(&self, err: RuntimeError) {
        let reason = err.as_message();
        if let Ok(mut slot) = self.failure.lock() {
            slot.get_or_insert(err);
        }
        self.request_termination(&reason);
    }

    pub(crate) fn take_failure(&self) -> Option<RuntimeError> {
        self.failure.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Flips the status to offline if `conn` is still the installed connection.
    ///
    /// A failure on a connection that was already replaced must not knock the
    /// fresh one offline.
    pub(crate) fn mark_offline(&self, conn: &Arc<T::Conn>) -> bool {
        self.guard.is_current(conn) && self.status.set(ConnectionStatus::Offline)
    }

    /// Records a failed write (ping or application send) on `conn`.
    pub(crate) fn write_failed(&self, conn: &Arc<T::Conn>, err: &TransportError) {
        self.mark_offline(conn);
        self.bus
            .publish(Event::new(EventKind::WriteFailed).with_reason(err.as_message()));
    }

    /// Marks that the local close handshake has started.
    pub(crate) fn begin_closing(&self) {
        self.closing.store(true, Ordering::Release);
    }

    pub(crate) fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }
}
