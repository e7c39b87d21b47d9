//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out the error sink uses to deliver events next to its own `tracing` output.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   activities ── publish(Event) ──► Bus ──► core::sink ──► tracing (per-kind level)
//!                                                  │
//!                                                  └──► SubscriberSet::emit(&Event)
//!                                                          ├──► [queue S1] ─► S1.on_event()
//!                                                          └──► [queue SN] ─► SN.on_event()
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use wsvisor::{Event, EventKind, Subscribe};
//!
//! struct ReconnectCounter;
//!
//! #[async_trait]
//! impl Subscribe for ReconnectCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::Connected {
//!             // increment a counter
//!         }
//!     }
//! }
//! ```

mod set;
mod subscriber;

pub use set::SubscriberSet;
pub use subscriber::Subscribe;
