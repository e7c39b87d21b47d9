use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::{
    config::Config,
    core::{session::Session, shared::Shared, supervisor::Supervisor},
    error::RuntimeError,
    events::Bus,
    handlers::{HandlerFn, HandlerRef, MessageHandler},
    subscribers::Subscribe,
    transport::Transport,
};

/// Builder for constructing a [`Supervisor`] with optional features.
pub struct SupervisorBuilder<T: Transport> {
    cfg: Config,
    transport: T,
    handler: Option<HandlerRef<T>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    interrupt: Option<BoxFuture<'static, ()>>,
}

impl<T: Transport> SupervisorBuilder<T> {
    /// Creates a new builder with the given configuration and transport.
    pub fn new(cfg: Config, transport: T) -> Self {
        Self {
            cfg,
            transport,
            handler: None,
            subscribers: Vec::new(),
            interrupt: None,
        }
    }

    /// Sets the handler invoked for every inbound payload.
    pub fn with_handler(mut self, handler: impl MessageHandler<T>) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sets a closure as the message handler.
    pub fn with_handler_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Session<T>, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.with_handler(HandlerFn::new(f))
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive every fault and lifecycle event through dedicated
    /// workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the OS interrupt with a custom future; shutdown starts when it completes.
    pub fn with_interrupt(mut self, interrupt: impl Future<Output = ()> + Send + 'static) -> Self {
        self.interrupt = Some(Box::pin(interrupt));
        self
    }

    /// Validates the address and wires the channels.
    ///
    /// Nothing is spawned until [`Supervisor::run`].
    pub fn build(self) -> Result<Supervisor<T>, RuntimeError> {
        let url = self.cfg.address()?;
        let (bus, bus_rx) = Bus::channel();
        let (pulse_tx, pulse_rx) = mpsc::channel(1);

        let shared = Arc::new(Shared::new(self.cfg, url, self.transport, bus, pulse_tx));
        Ok(Supervisor {
            shared,
            bus_rx,
            pulse_rx,
            handler: self.handler,
            subscribers: self.subscribers,
            interrupt: self.interrupt,
        })
    }
}
