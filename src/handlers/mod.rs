//! # Message handlers.
//!
//! This module provides the callbacks the dispatcher drives:
//! - [`MessageHandler`] - trait invoked once per inbound payload, in arrival order
//! - [`HandlerFn`] - closure-backed implementation
//! - [`StdoutHandler`] - default used when no handler is registered

mod handler;
mod handler_fn;
mod stdout;

pub use handler::{HandlerRef, MessageHandler};
pub use handler_fn::HandlerFn;
pub use stdout::StdoutHandler;
