//! # WebSocket transport over `tokio-tungstenite`.
//!
//! [`WsTransport`] dials `ws://` endpoints; [`WsConnection`] splits the socket into
//! a write half and a read half, each behind its own async mutex, so the ping
//! emitter and application sends never wait on a blocked read.
//!
//! ```text
//! send(Frame) ──► Mutex<SplitSink>  ──► socket
//! receive()   ◄── Mutex<SplitStream> ◄── socket
//!                        │
//!                        └─ Pong ─► liveness callback
//! ```

use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{
    self, Message,
    protocol::{CloseFrame, frame::coding::CloseCode},
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::error::TransportError;
use crate::transport::{Connection, Frame, FrameKind, LivenessCallback, Transport};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials WebSocket endpoints.
#[derive(Clone, Debug, Default)]
pub struct WsTransport {
    connect_timeout: Option<Duration>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds a single dial (TCP connect + upgrade handshake).
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for WsTransport {
    type Conn = WsConnection;

    async fn dial(&self, url: &Url) -> Result<WsConnection, TransportError> {
        let connect = connect_async(url.as_str());
        let result = match self.connect_timeout {
            Some(deadline) => timeout(deadline, connect)
                .await
                .map_err(|_| TransportError::Timeout { timeout: deadline })?,
            None => connect.await,
        };

        let (stream, _response) = result.map_err(|e| TransportError::Dial {
            url: url.to_string(),
            error: e.to_string(),
        })?;
        Ok(WsConnection::new(stream))
    }
}

/// Established WebSocket connection.
pub struct WsConnection {
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    liveness: ArcSwapOption<LivenessCallback>,
}

impl WsConnection {
    fn new(stream: WsStream) -> Self {
        let (sink, stream) = stream.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            liveness: ArcSwapOption::empty(),
        }
    }

    fn notify_liveness(&self) {
        if let Some(callback) = self.liveness.load().as_ref() {
            callback();
        }
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        let message = into_message(frame)?;
        self.sink
            .lock()
            .await
            .send(message)
            .await
            .map_err(|e| match e {
                tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                    TransportError::Closed
                }
                other => TransportError::Send {
                    error: other.to_string(),
                },
            })
    }

    async fn receive(&self) -> Result<Frame, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            let message = match stream.next().await {
                None => return Err(TransportError::Closed),
                Some(Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed)) => {
                    return Err(TransportError::Closed);
                }
                Some(Err(e)) => {
                    return Err(TransportError::Receive {
                        error: e.to_string(),
                    });
                }
                Some(Ok(message)) => message,
            };

            match message {
                Message::Text(text) => return Ok(Frame::text(text)),
                Message::Binary(data) => return Ok(Frame::binary(data)),
                // tungstenite queues the pong reply; it goes out with the next write.
                Message::Ping(_) => continue,
                Message::Pong(_) => {
                    self.notify_liveness();
                    continue;
                }
                Message::Close(Some(close)) => {
                    return Ok(Frame::close(u16::from(close.code), &close.reason));
                }
                Message::Close(None) => return Ok(Frame::close_empty()),
                Message::Frame(raw) => {
                    return Ok(Frame::new(
                        FrameKind::Unknown,
                        Bytes::copy_from_slice(raw.payload()),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        match self.sink.lock().await.close().await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::Send {
                error: e.to_string(),
            }),
        }
    }

    fn on_liveness(&self, callback: LivenessCallback) {
        self.liveness.store(Some(std::sync::Arc::new(callback)));
    }
}

fn into_message(frame: Frame) -> Result<Message, TransportError> {
    let payload = frame.payload.to_vec();
    let message = match frame.kind {
        FrameKind::Text => Message::Text(String::from_utf8_lossy(&payload).into_owned()),
        FrameKind::Binary => Message::Binary(payload),
        FrameKind::Ping => Message::Ping(payload),
        FrameKind::Pong => Message::Pong(payload),
        FrameKind::Close => match frame.close_code() {
            Some(code) => Message::Close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: frame.close_reason().into(),
            })),
            None => Message::Close(None),
        },
        FrameKind::Unknown => {
            return Err(TransportError::Send {
                error: "cannot send a frame of unknown kind".to_string(),
            });
        }
    };
    Ok(message)
}
