//! # Session handle given to message handlers and callers.
//!
//! A [`Session`] is a cheap clone of the supervisor's shared state. It never owns
//! the connection: every send takes a fresh snapshot of the current handle, and
//! fails with [`TransportError::Closed`] while none is installed.

use std::sync::Arc;

use bytes::Bytes;
use url::Url;

use crate::{
    config::Config,
    core::{shared::Shared, status::ConnectionStatus},
    error::TransportError,
    transport::{Connection, Frame, Transport},
};

/// Handle to a running (or not yet started) supervised connection.
pub struct Session<T: Transport> {
    pub(crate) shared: Arc<Shared<T>>,
}

impl<T: Transport> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Transport> Session<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared }
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.get()
    }

    /// Target address of the session.
    pub fn address(&self) -> &Url {
        &self.shared.url
    }

    /// Configuration the supervisor was built with.
    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    /// Snapshot of the installed connection, if any.
    ///
    /// Valid for one call; the handle may be replaced right after.
    pub fn connection(&self) -> Option<Arc<T::Conn>> {
        self.shared.guard.current()
    }

    /// Sends one frame on the current connection.
    ///
    /// A failed write flips the status offline (which triggers a reconnect when
    /// enabled) and is reported as a `WriteFailed` event.
    pub async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        let conn = self.connection().ok_or(TransportError::Closed)?;
        conn.send(frame).await.inspect_err(|err| {
            self.shared.write_failed(&conn, err);
        })
    }

    /// Sends a UTF-8 text frame; same failure handling as [`send`](Self::send).
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.send(Frame::text(text)).await
    }

    /// Sends a binary frame; same failure handling as [`send`](Self::send).
    pub async fn send_binary(&self, payload: impl Into<Bytes>) -> Result<(), TransportError> {
        self.send(Frame::binary(payload)).await
    }

    /// Asks the supervisor to stop, as if the session had ended on its own.
    ///
    /// No close frame is sent; cleanup releases the connection.
    pub fn request_shutdown(&self) {
        self.shared.request_termination("requested by session");
    }

    /// Resolves once termination has been requested.
    pub async fn terminated(&self) {
        self.shared.exit.cancelled().await;
    }
}
