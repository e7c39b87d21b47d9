//! # Supervisor: owns one connection's lifecycle from first dial to release.
//!
//! The [`Supervisor`] holds the shared state (config, status, connection guard,
//! channels), establishes the first connection, starts every activity, then
//! blocks on the termination signal and cleans up.
//!
//! ## High-level architecture
//! ```text
//! run():
//!   spawn sink::drain(bus_rx, SubscriberSet)                   (ErrorSink)
//!   reconnect::acquire()  ── races the interrupt ──► first connection or Err
//!
//!   JoinSet:
//!     heartbeat::ping_loop      every ping_interval ─► Ping ─► Err → Offline + WriteFailed
//!     heartbeat::expiry_loop    pulse_rx ─► ExpiryAccumulator ─► Expired → Offline + exit
//!     shutdown::coordinate      interrupt | receive_done ─► close handshake ─► exit
//!     router::receive_loop      conn.receive() ─► inbound queue
//!     router::dispatch_loop     inbound queue ─► MessageHandler
//!     reconnect::health_loop    Offline ─► acquire() (reconnect on) | wait receive_done
//!
//!   exit.cancelled().await
//!
//! cleanup:
//!   stop timers, status = Offline
//!   guard.release_once() ─► conn.close()  (at most once)
//!   wait_all_with_grace(cfg.grace) ─► abort stragglers → GraceExceeded
//!   stop sink (flushes queued events, shuts subscribers down)
//! ```
//!
//! ## Example
//! ```no_run
//! use std::collections::HashMap;
//! use wsvisor::{Config, Supervisor, WsTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let raw: HashMap<String, String> = HashMap::from([
//!         ("HOST".into(), "localhost".into()),
//!         ("PORT".into(), "8088".into()),
//!         ("PATH".into(), "/echo".into()),
//!         ("RECONNECT".into(), "YES".into()),
//!         ("EXPIRE_TIME".into(), "0".into()),
//!     ]);
//!     let cfg = Config::from_map(&raw)?;
//!     let mut sup = Supervisor::new(cfg, WsTransport::new())?;
//!     sup.set_message_handler_fn(|_session, payload| async move {
//!         println!("got {} bytes", payload.len());
//!     });
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        builder::SupervisorBuilder,
        heartbeat, reconnect, router,
        session::Session,
        shared::Shared,
        shutdown, sink,
        status::ConnectionStatus,
    },
    config::Config,
    error::RuntimeError,
    events::{Event, EventKind},
    handlers::{HandlerFn, HandlerRef, MessageHandler, StdoutHandler},
    subscribers::{Subscribe, SubscriberSet},
    transport::{Connection, Transport},
};

/// Drives one supervised connection.
pub struct Supervisor<T: Transport> {
    pub(crate) shared: Arc<Shared<T>>,
    pub(crate) bus_rx: mpsc::UnboundedReceiver<Event>,
    pub(crate) pulse_rx: mpsc::Receiver<()>,
    pub(crate) handler: Option<HandlerRef<T>>,
    pub(crate) subscribers: Vec<Arc<dyn Subscribe>>,
    pub(crate) interrupt: Option<BoxFuture<'static, ()>>,
}

impl<T: Transport> Supervisor<T> {
    /// Starts a builder for the given config and transport.
    pub fn builder(cfg: Config, transport: T) -> SupervisorBuilder<T> {
        SupervisorBuilder::new(cfg, transport)
    }

    /// Creates a supervisor with the default handler, no subscribers and the OS interrupt.
    pub fn new(cfg: Config, transport: T) -> Result<Self, RuntimeError> {
        Self::builder(cfg, transport).build()
    }

    /// Replaces the message handler. Without one, payloads go to stdout.
    pub fn set_message_handler(&mut self, handler: impl MessageHandler<T>) {
        self.handler = Some(Arc::new(handler));
    }

    /// Closure form of [`set_message_handler`](Self::set_message_handler).
    pub fn set_message_handler_fn<F, Fut>(&mut self, f: F)
    where
        F: Fn(Session<T>, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.set_message_handler(HandlerFn::new(f));
    }

    /// Adds an event subscriber; useful when it needs [`session`](Self::session).
    pub fn add_subscriber(&mut self, subscriber: Arc<dyn Subscribe>) {
        self.subscribers.push(subscriber);
    }

    /// Handle for sending and inspecting the status from outside the handler.
    pub fn session(&self) -> Session<T> {
        Session::new(Arc::clone(&self.shared))
    }

    /// Runs until termination is requested and cleanup has finished.
    ///
    /// Returns an error when the first connection cannot be established, when
    /// the dial budget runs out later, or when activities outlive the grace period.
    pub async fn run(self) -> Result<(), RuntimeError> {
        let Self {
            shared,
            bus_rx,
            pulse_rx,
            handler,
            subscribers,
            interrupt,
        } = self;

        let sink_stop = CancellationToken::new();
        let sink = tokio::spawn(sink::drain(
            bus_rx,
            SubscriberSet::new(subscribers),
            sink_stop.clone(),
        ));

        let mut interrupt = interrupt.unwrap_or_else(os_interrupt);
        let first = select! {
            res = reconnect::acquire(&shared) => Some(res),
            _ = &mut interrupt => None,
        };
        match first {
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                shared.fail(err);
                return finish(&shared, JoinSet::new(), sink_stop, sink).await;
            }
            None => {
                shared.bus.publish(Event::new(EventKind::InterruptReceived));
                shared.request_termination("interrupt");
                return finish(&shared, JoinSet::new(), sink_stop, sink).await;
            }
        }

        let handler = handler.unwrap_or_else(|| Arc::new(StdoutHandler));
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let timers = CancellationToken::new();

        let mut set = JoinSet::new();
        set.spawn(heartbeat::ping_loop(Arc::clone(&shared), timers.clone()));
        set.spawn(heartbeat::expiry_loop(Arc::clone(&shared), pulse_rx, timers.clone()));
        set.spawn(shutdown::coordinate(Arc::clone(&shared), inbound_tx.clone(), interrupt));
        set.spawn(router::receive_loop(Arc::clone(&shared), inbound_tx));
        set.spawn(router::dispatch_loop(
            Session::new(Arc::clone(&shared)),
            handler,
            inbound_rx,
        ));
        set.spawn(reconnect::health_loop(Arc::clone(&shared)));

        shared.exit.cancelled().await;
        timers.cancel();
        finish(&shared, set, sink_stop, sink).await
    }
}

/// Default interrupt source: the OS signal. A failed registration never fires.
fn os_interrupt() -> BoxFuture<'static, ()> {
    Box::pin(async {
        if let Err(err) = shutdown::wait_for_interrupt().await {
            tracing::warn!(error = %err, "cannot listen for the interrupt signal");
            std::future::pending::<()>().await;
        }
    })
}

async fn finish<T: Transport>(
    shared: &Shared<T>,
    set: JoinSet<()>,
    sink_stop: CancellationToken,
    sink: JoinHandle<()>,
) -> Result<(), RuntimeError> {
    release(shared).await;
    let joined = wait_all_with_grace(set, shared.cfg.grace).await;

    sink_stop.cancel();
    let _ = sink.await;

    match shared.take_failure() {
        Some(err) => Err(err),
        None => joined,
    }
}

/// Forces the status offline, then closes the connection handle exactly once.
///
/// Offline goes first so no reader sees `Online` without an installed handle.
async fn release<T: Transport>(shared: &Shared<T>) {
    shared.status.set(ConnectionStatus::Offline);
    if let Some(conn) = shared.guard.release_once().await {
        let wait = shared.cfg.close_timeout;
        match time::timeout(wait, conn.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => shared
                .bus
                .publish(Event::new(EventKind::CloseFailed).with_reason(err.as_message())),
            Err(_) => shared.bus.publish(
                Event::new(EventKind::CloseFailed)
                    .with_timeout(wait)
                    .with_reason("socket close timed out"),
            ),
        }
        shared.bus.publish(Event::new(EventKind::ConnectionClosed));
    }
}

/// Waits for every activity; aborts the ones still running after `grace`.
async fn wait_all_with_grace(mut set: JoinSet<()>, grace: Duration) -> Result<(), RuntimeError> {
    let done = async { while set.join_next().await.is_some() {} };
    let finished = time::timeout(grace, done).await.is_ok();
    if finished {
        return Ok(());
    }

    let stuck = set.len();
    set.abort_all();
    while set.join_next().await.is_some() {}
    Err(RuntimeError::GraceExceeded { grace, stuck })
}
