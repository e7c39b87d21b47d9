//! # Default handler: prints each payload on standard output.

use std::io::Write;

use async_trait::async_trait;
use bytes::Bytes;

use crate::core::Session;
use crate::handlers::handler::MessageHandler;
use crate::transport::Transport;

/// Writes every payload as one line of (lossy) UTF-8 text.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutHandler;

#[async_trait]
impl<T: Transport> MessageHandler<T> for StdoutHandler {
    async fn on_message(&self, _session: &Session<T>, payload: Bytes) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", String::from_utf8_lossy(&payload));
    }
}
