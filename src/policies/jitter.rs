//! # Jitter for dial retry delays.
//!
//! When one server restarts, every client it served loses its socket in the same
//! instant. With a constant backoff they all redial on the same tick; [`JitterPolicy`]
//! spreads those redials out. It is selected with the `JITTER` config key.
//!
//! | `JITTER` | Variant                 | Delay for a base `d`       |
//! |----------|-------------------------|----------------------------|
//! | `none`   | [`JitterPolicy::None`]  | `d`                        |
//! | `full`   | [`JitterPolicy::Full`]  | uniform in `[0, d]`        |
//! | `equal`  | [`JitterPolicy::Equal`] | `d/2` + uniform `[0, d/2]` |

use rand::Rng;
use std::time::Duration;

/// Randomization applied to a dial backoff delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    #[default]
    None,
    Full,
    Equal,
}

impl JitterPolicy {
    /// Parses a `JITTER` value, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(JitterPolicy::None),
            "full" => Some(JitterPolicy::Full),
            "equal" => Some(JitterPolicy::Equal),
            _ => None,
        }
    }

    /// Randomizes `delay`; the result never exceeds it.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        match self {
            JitterPolicy::None => delay,
            _ if ms == 0 => Duration::ZERO,
            JitterPolicy::Full => Duration::from_millis(rand::rng().random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                Duration::from_millis(half + rand::rng().random_range(0..=ms - half))
            }
        }
    }
}
