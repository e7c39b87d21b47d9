//! # Reconnector: dial under the guard until a connection is online.
//!
//! [`acquire`] is the only code path that creates connections. It runs inside the
//! [`ConnectionGuard`](crate::core::guard::ConnectionGuard) critical section, so
//! concurrent triggers (a failed ping and a failed read at the same moment)
//! produce one dial loop; the second caller reuses the result.
//!
//! ## Flow
//! ```text
//! lock guard
//!   ├─► released / exit requested?      → Err(Closed)
//!   ├─► already online (coalesced)?     → Ok(current)
//!   └─► loop {
//!         publish Connecting{attempt}
//!         dial(url)  (bounded by connect_timeout, cancellable by exit)
//!           ├─ Ok  → register liveness callback, install, status = Online,
//!           │        publish Connected → return
//!           └─ Err → failures += 1
//!                    ├─ budget exceeded → publish DialFailed + DialExhausted → Err
//!                    └─ publish DialFailed{delay}, sleep(backoff) (cancellable)
//!       }
//! ```
//!
//! The health loop watches the status and calls [`acquire`] again each time it
//! falls to `Offline` (only with [`ReconnectPolicy::Always`](crate::ReconnectPolicy)).

use std::sync::Arc;

use tokio::{select, time};

use crate::{
    core::{
        shared::Shared,
        status::{ConnectionStatus, wait_until},
    },
    error::{RuntimeError, TransportError},
    events::{Event, EventKind},
    transport::{Connection, Transport},
};

/// Returns an online connection, dialing as often as the budget allows.
pub(crate) async fn acquire<T: Transport>(shared: &Shared<T>) -> Result<Arc<T::Conn>, RuntimeError> {
    let held = shared.guard.lock().await;
    if shared.guard.is_released() || shared.exit.is_cancelled() {
        return Err(RuntimeError::Closed);
    }
    if shared.status.get().is_online() {
        if let Some(conn) = shared.guard.current() {
            return Ok(conn);
        }
    }

    let budget = shared.cfg.dial_budget();
    let mut failures: u64 = 0;

    loop {
        let attempt = failures + 1;
        shared
            .bus
            .publish(Event::new(EventKind::Connecting).with_attempt(attempt));

        let dialed = select! {
            res = dial(shared) => res,
            _ = shared.exit.cancelled() => return Err(RuntimeError::Closed),
        };

        match dialed {
            Ok(conn) => {
                let conn = Arc::new(conn);
                let pulse = shared.pulse_tx.clone();
                conn.on_liveness(Box::new(move || {
                    let _ = pulse.try_send(());
                }));

                if !shared.guard.install(&held, Arc::clone(&conn)) {
                    return Err(RuntimeError::Closed);
                }
                shared.status.set(ConnectionStatus::Online);
                shared
                    .bus
                    .publish(Event::new(EventKind::Connected).with_attempt(attempt));
                return Ok(conn);
            }
            Err(err) => {
                failures += 1;
                if budget.is_some_and(|limit| failures > limit) {
                    shared.bus.publish(
                        Event::new(EventKind::DialFailed)
                            .with_attempt(attempt)
                            .with_reason(err.as_message()),
                    );
                    shared.bus.publish(
                        Event::new(EventKind::DialExhausted)
                            .with_attempt(failures)
                            .with_reason(err.as_message()),
                    );
                    return Err(RuntimeError::DialExhausted {
                        url: shared.url.to_string(),
                        attempts: failures,
                        last: err,
                    });
                }

                let delay = shared
                    .cfg
                    .backoff
                    .next(u32::try_from(failures - 1).unwrap_or(u32::MAX));
                shared.bus.publish(
                    Event::new(EventKind::DialFailed)
                        .with_attempt(attempt)
                        .with_delay(delay)
                        .with_reason(err.as_message()),
                );

                let sleep = time::sleep(delay);
                tokio::pin!(sleep);
                select! {
                    _ = &mut sleep => {}
                    _ = shared.exit.cancelled() => return Err(RuntimeError::Closed),
                }
            }
        }
    }
}

/// One dial, bounded by `connect_timeout` when configured.
async fn dial<T: Transport>(shared: &Shared<T>) -> Result<T::Conn, TransportError> {
    let dial = shared.transport.dial(&shared.url);
    match shared.cfg.connect_timeout {
        Some(deadline) => time::timeout(deadline, dial)
            .await
            .map_err(|_| TransportError::Timeout { timeout: deadline })?,
        None => dial.await,
    }
}

/// Watches the status and reconnects every time it falls offline.
///
/// With reconnection disabled it only waits for the receive loop to finish.
pub(crate) async fn health_loop<T: Transport>(shared: Arc<Shared<T>>) {
    if !shared.cfg.reconnect.is_enabled() {
        select! {
            _ = shared.receive_done.cancelled() => {}
            _ = shared.exit.cancelled() => {}
        }
        return;
    }

    let mut status = shared.status.subscribe();
    loop {
        let offline = select! {
            ok = wait_until(&mut status, |s| !s.is_online()) => ok,
            _ = shared.exit.cancelled() => false,
        };
        if !offline {
            return;
        }

        match acquire(&shared).await {
            Ok(_) => {}
            Err(RuntimeError::Closed) => return,
            Err(err) => {
                shared.fail(err);
                return;
            }
        }
    }
}
