//! # Example: echo client
//!
//! Connects to `ws://localhost:8088/echo`, reconnects forever, never expires,
//! logs every inbound message and sends a greeting after each connect.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example echo
//! ```
//! Override the target with `HOST`, `PORT`, `PATH`, `RECONNECT`, `EXPIRE_TIME`
//! environment variables. Press Ctrl-C for a graceful close.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing_subscriber::EnvFilter;
use wsvisor::{
    Config, Event, EventKind, MessageHandler, Session, Subscribe, Supervisor, WsTransport,
};

struct Logger;

#[async_trait]
impl MessageHandler<WsTransport> for Logger {
    async fn on_message(&self, session: &Session<WsTransport>, payload: Bytes) {
        tracing::info!(
            from = %session.address(),
            message = %String::from_utf8_lossy(&payload),
            "inbound"
        );
    }

    async fn on_interrupt(&self, _session: &Session<WsTransport>) {
        tracing::info!("closing");
    }
}

/// Greets the server every time a connection comes up.
struct Greeter {
    session: Session<WsTransport>,
}

#[async_trait]
impl Subscribe for Greeter {
    async fn on_event(&self, event: &Event) {
        if event.kind == EventKind::Connected {
            if let Err(err) = self.session.send_text("hello").await {
                tracing::warn!(error = %err, "greeting failed");
            }
        }
    }

    fn name(&self) -> &'static str {
        "greeter"
    }
}

fn load() -> HashMap<String, String> {
    let mut raw: HashMap<String, String> = [
        ("HOST", "localhost"),
        ("PORT", "8088"),
        ("PATH", "/echo"),
        ("RECONNECT", "YES"),
        ("EXPIRE_TIME", "0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for key in ["HOST", "PORT", "PATH", "RECONNECT", "EXPIRE_TIME", "DIAL_ATTEMPTS"] {
        if let Ok(value) = std::env::var(key) {
            raw.insert(key.to_string(), value);
        }
    }
    raw
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_map(&load())?;
    let mut sup = Supervisor::new(cfg, WsTransport::new())?;
    sup.set_message_handler(Logger);

    let greeter = Arc::new(Greeter {
        session: sup.session(),
    });
    sup.add_subscriber(greeter);

    sup.run().await?;
    Ok(())
}
