//! Runtime core: orchestration and lifecycle.
//!
//! This module contains the embedded implementation of the wsvisor runtime.
//! The public API from this module is [`Supervisor`], its builder, the
//! [`Session`] handle and [`ConnectionStatus`].
//!
//! Internal modules:
//! - [`guard`]: mutex-guarded cell holding the current connection;
//! - [`reconnect`]: dial loop under the guard plus the health check;
//! - [`heartbeat`]: ping emitter and liveness expiry accumulator;
//! - [`router`]: receive loop and in-order dispatch to the handler;
//! - [`shutdown`]: interrupt handling and the close handshake;
//! - [`sink`]: single consumer of the event bus (logging + subscribers);
//! - [`supervisor`]: starts everything, waits for exit, cleans up.

mod builder;
mod guard;
mod heartbeat;
mod reconnect;
mod router;
mod session;
mod shared;
mod shutdown;
mod sink;
mod status;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use session::Session;
pub use shutdown::wait_for_interrupt;
pub use status::ConnectionStatus;
pub use supervisor::Supervisor;
