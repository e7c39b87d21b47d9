//! Runtime events: types and the fault bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and metadata
//! - [`Bus`] unbounded multi-producer channel drained by the error sink
//!
//! ## Quick reference
//! - **Publishers**: reconnector, heartbeat, router, shutdown coordinator, session handle.
//! - **Consumer**: `core::sink` logs each event and fans it out to subscribers.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
