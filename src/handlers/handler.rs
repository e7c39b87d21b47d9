//! # Application callback for inbound messages.
//!
//! The dispatcher awaits [`MessageHandler::on_message`] for each payload before
//! pulling the next one, so a handler sees messages strictly in arrival order.
//! A slow handler delays later messages; it never drops them.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::core::Session;
use crate::transport::Transport;

/// Receives every inbound payload of a supervised session.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use bytes::Bytes;
/// use wsvisor::{MessageHandler, Session, WsTransport};
///
/// struct Echo;
///
/// #[async_trait]
/// impl MessageHandler<WsTransport> for Echo {
///     async fn on_message(&self, session: &Session<WsTransport>, payload: Bytes) {
///         let _ = session.send_binary(payload).await;
///     }
/// }
/// ```
#[async_trait]
pub trait MessageHandler<T: Transport>: Send + Sync + 'static {
    /// Handles one data payload (text or binary, or the payload of a close frame).
    async fn on_message(&self, session: &Session<T>, payload: Bytes);

    /// Called once when the interrupt arrives while online, before the close frame goes out.
    async fn on_interrupt(&self, _session: &Session<T>) {}
}

/// Shared handle to a handler.
pub type HandlerRef<T> = Arc<dyn MessageHandler<T>>;
