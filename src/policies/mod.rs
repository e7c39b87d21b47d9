//! Reconnect and retry-delay policies.
//!
//! ## Contents
//! - [`ReconnectPolicy`] whether the session dials again after losing the connection
//! - [`BackoffPolicy`] how long to sleep between failed dial attempts
//! - [`JitterPolicy`]  randomization applied to the backoff delay (`JITTER` key)
//!
//! ## Quick wiring
//! ```text
//! Config { reconnect: ReconnectPolicy, backoff: BackoffPolicy, .. }
//!      └─► core::reconnect::Reconnector uses:
//!           - reconnect to size the dial budget (Never → one attempt)
//!           - backoff.next(failures) to schedule the next dial (jitter included)
//! ```
//!
//! ## Defaults
//! - `ReconnectPolicy::Never` (unless `RECONNECT` says otherwise).
//! - `BackoffPolicy::default()` → first=1s, factor=1.0 (constant), max=30s, jitter=None.

mod backoff;
mod jitter;
mod reconnect;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use reconnect::ReconnectPolicy;
