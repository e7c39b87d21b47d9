//! # Reconnect policy for a supervised session.
//!
//! [`ReconnectPolicy`] decides what happens once the connection is lost.
//!
//! - [`ReconnectPolicy::Always`] the health check dials again (through the guard)
//!   every time the status falls to offline.
//! - [`ReconnectPolicy::Never`] a single dial attempt is made at startup; after that
//!   the session ends when the receive loop finishes on a close frame.
//!
//! ## Parsing
//! ```text
//! "YES" | "Y" (any case, trimmed) → Always
//! anything else, or absent        → Never
//! ```

/// Policy controlling whether the session dials again after losing the connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Dial once; never reconnect (default).
    #[default]
    Never,
    /// Reconnect whenever the connection goes offline.
    Always,
}

impl ReconnectPolicy {
    /// Parses the `RECONNECT` configuration value.
    ///
    /// Unrecognized values deterministically map to [`ReconnectPolicy::Never`].
    pub fn from_flag(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("yes") || v.eq_ignore_ascii_case("y") => {
                ReconnectPolicy::Always
            }
            _ => ReconnectPolicy::Never,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        matches!(self, ReconnectPolicy::Always)
    }
}
