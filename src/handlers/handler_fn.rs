//! # Closure-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps `F: Fn(Session<T>, Bytes) -> Fut`. Each call gets its own
//! clone of the session, so the returned future owns everything it touches.
//!
//! ## Example
//! ```rust
//! use bytes::Bytes;
//! use wsvisor::{HandlerFn, HandlerRef, Session, WsTransport};
//!
//! let h: HandlerRef<WsTransport> =
//!     HandlerFn::<WsTransport, _>::arc(|_s: Session<WsTransport>, payload: Bytes| async move {
//!         println!("{} bytes", payload.len());
//!     });
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::core::Session;
use crate::handlers::handler::MessageHandler;
use crate::transport::Transport;

/// Function-backed message handler.
pub struct HandlerFn<T, F> {
    f: F,
    _transport: PhantomData<fn(T)>,
}

impl<T, F> HandlerFn<T, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _transport: PhantomData,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<T, F, Fut> MessageHandler<T> for HandlerFn<T, F>
where
    T: Transport,
    F: Fn(Session<T>, Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_message(&self, session: &Session<T>, payload: Bytes) {
        (self.f)(session.clone(), payload).await;
    }
}
