//! # wsvisor
//!
//! **Wsvisor** supervises one persistent client-side WebSocket connection.
//!
//! It keeps the connection alive across failures (reconnect with backoff),
//! emits heartbeats and detects silent peers, delivers inbound messages to a
//! handler in arrival order, and shuts down with a bounded close handshake on
//! interrupt. The wire protocol sits behind the [`Transport`] / [`Connection`]
//! traits; [`WsTransport`] is the `tokio-tungstenite` implementation.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                       ┌───────────────────────────┐
//!                       │  Config::from_map(&map)   │
//!                       └─────────────┬─────────────┘
//!                                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (lifecycle orchestrator)                              │
//! │  - ConnectionGuard (mutex + current connection)                   │
//! │  - ConnectionStatus (watch: Online / Offline)                     │
//! │  - Bus (faults + lifecycle events, single consumer)               │
//! │  - exit / receive_done (cancellation tokens)                      │
//! └──────┬───────────┬────────────┬────────────┬────────────┬─────────┘
//!        ▼           ▼            ▼            ▼            ▼
//!   ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐
//!   │ health  │ │  ping /  │ │ receive  │ │ dispatch │ │ shutdown │
//!   │ check + │ │  expiry  │ │  loop    │ │  loop    │ │ coord.   │
//!   │ redial  │ │          │ │          │ │          │ │          │
//!   └────┬────┘ └────┬─────┘ └────┬─────┘ └────┬─────┘ └────┬─────┘
//!        │           │            │            ▼            │
//!        │           │            │     MessageHandler      │
//!        └───────────┴─────┬──────┴─────────────────────────┘
//!                          ▼
//!              Bus ──► sink ──► tracing + SubscriberSet
//! ```
//!
//! ### Lifecycle
//! ```text
//! run()
//!   ├─► acquire(): dial until Online (backoff between failures, bounded budget)
//!   ├─► spawn activities
//!   ├─► wait for exit:
//!   │     - interrupt → close frame (1000, "") → wait ≤ 1s for receive loop
//!   │     - receive loop ended (close frame, reconnect off)
//!   │     - liveness expired
//!   │     - dial budget exhausted while reconnecting
//!   └─► cleanup: close connection once, stop timers, join within grace
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                           |
//! |-------------------|--------------------------------------------------------------|----------------------------------------------|
//! | **Supervision**   | Connection lifecycle, reconnect, heartbeat, shutdown.        | [`Supervisor`], [`SupervisorBuilder`]        |
//! | **Handlers**      | Application callback per inbound payload.                    | [`MessageHandler`], [`HandlerFn`]            |
//! | **Session**       | Send frames and inspect status from anywhere.                | [`Session`], [`ConnectionStatus`]            |
//! | **Transport**     | Pluggable dial/send/receive seam, WebSocket implementation.  | [`Transport`], [`Connection`], [`WsTransport`] |
//! | **Policies**      | Reconnect on/off, delay between dials.                       | [`ReconnectPolicy`], [`BackoffPolicy`]       |
//! | **Subscriber API**| Observe faults and lifecycle events.                         | [`Subscribe`], [`Event`]                     |
//! | **Errors**        | Typed errors for config, transport and runtime.              | [`ConfigError`], [`TransportError`], [`RuntimeError`] |
//!
//! ## Example
//! ```no_run
//! use std::collections::HashMap;
//! use wsvisor::{Config, Session, Supervisor, WsTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let raw: HashMap<String, String> = HashMap::from([
//!         ("HOST".into(), "localhost".into()),
//!         ("PORT".into(), "8088".into()),
//!         ("PATH".into(), "/echo".into()),
//!         ("RECONNECT".into(), "YES".into()),
//!         ("EXPIRE_TIME".into(), "10".into()),
//!     ]);
//!     let cfg = Config::from_map(&raw)?;
//!
//!     let sup = Supervisor::builder(cfg, WsTransport::new())
//!         .with_handler_fn(|session: Session<WsTransport>, payload| async move {
//!             println!("{} says {:?}", session.address(), payload);
//!         })
//!         .build()?;
//!
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod handlers;
mod policies;
mod subscribers;
mod transport;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{ConnectionStatus, Session, Supervisor, SupervisorBuilder, wait_for_interrupt};
pub use error::{ConfigError, RuntimeError, TransportError};
pub use events::{Event, EventKind};
pub use handlers::{HandlerFn, HandlerRef, MessageHandler, StdoutHandler};
pub use policies::{BackoffPolicy, JitterPolicy, ReconnectPolicy};
pub use subscribers::{Subscribe, SubscriberSet};
pub use transport::ws::{WsConnection, WsTransport};
pub use transport::{CLOSE_NORMAL, Connection, Frame, FrameKind, LivenessCallback, Transport};
