//! # Transport seam: dial, send, receive, close, liveness callback.
//!
//! The runtime never touches the wire protocol. It talks to a [`Transport`]
//! (which dials) and the [`Connection`] it returns (which moves [`Frame`]s).
//! Handshake and framing live behind these traits; [`ws::WsTransport`] is the
//! WebSocket implementation.
//!
//! ## Contract
//! - `send` and `receive` may be called concurrently from different activities.
//! - `receive` consumes protocol control frames itself: pongs invoke the
//!   registered liveness callback, pings are answered by the protocol layer.
//!   It returns data frames, close frames and frames it cannot classify.
//! - `close` may be called at most once by the runtime; further calls should be
//!   harmless.

pub mod ws;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use url::Url;

use crate::error::TransportError;

/// Close status code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;

/// Invoked by a connection whenever a liveness acknowledgment (pong) arrives.
pub type LivenessCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Classification of a frame moving over a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Text,
    Binary,
    Ping,
    Pong,
    /// Payload is a big-endian status code followed by UTF-8 reason text (may be empty).
    Close,
    /// A frame kind the transport could not map.
    Unknown,
}

/// One frame: its kind plus the raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(kind: FrameKind, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(FrameKind::Text, Bytes::from(text.into()))
    }

    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Binary, payload)
    }

    pub fn ping(payload: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Ping, payload)
    }

    /// Builds a close frame carrying `code` and `reason`.
    pub fn close(code: u16, reason: &str) -> Self {
        let mut buf = BytesMut::with_capacity(2 + reason.len());
        buf.put_u16(code);
        buf.put_slice(reason.as_bytes());
        Self::new(FrameKind::Close, buf.freeze())
    }

    /// Close frame with no status code at all.
    pub fn close_empty() -> Self {
        Self::new(FrameKind::Close, Bytes::new())
    }

    /// Returns the status code of a close frame, if it carries one.
    pub fn close_code(&self) -> Option<u16> {
        if self.kind != FrameKind::Close || self.payload.len() < 2 {
            return None;
        }
        Some(u16::from_be_bytes([self.payload[0], self.payload[1]]))
    }

    /// Returns the reason text of a close frame (empty when absent).
    pub fn close_reason(&self) -> String {
        if self.kind != FrameKind::Close || self.payload.len() <= 2 {
            return String::new();
        }
        String::from_utf8_lossy(&self.payload[2..]).into_owned()
    }

    /// True for close frames and unclassified frames: both end the receive loop
    /// when reconnection is disabled.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, FrameKind::Close | FrameKind::Unknown)
    }
}

/// Establishes connections to a remote endpoint.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Live connection produced by a successful dial.
    type Conn: Connection;

    /// Dials `url` and completes the protocol handshake.
    async fn dial(&self, url: &Url) -> Result<Self::Conn, TransportError>;
}

/// One established, bidirectional connection.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Writes one frame.
    async fn send(&self, frame: Frame) -> Result<(), TransportError>;

    /// Reads the next data, close or unknown frame.
    async fn receive(&self) -> Result<Frame, TransportError>;

    /// Releases the underlying socket.
    async fn close(&self) -> Result<(), TransportError>;

    /// Registers the callback invoked for every liveness acknowledgment.
    ///
    /// A later registration replaces the earlier one.
    fn on_liveness(&self, callback: LivenessCallback);
}
