//! # Session configuration.
//!
//! Provides [`Config`], the validated and immutable settings for one supervised
//! connection. It is built once from the string mapping the process loads
//! (`HOST`, `PORT`, `PATH`, `RECONNECT`, `EXPIRE_TIME`, optionally `DIAL_ATTEMPTS`
//! and `JITTER`)
//! and never mutated after [`Supervisor::run`](crate::Supervisor::run) starts.
//!
//! ## Sentinel values
//! - `expire_time = 0` → liveness never expires
//! - `dial_attempts = 0` → dial forever (only with [`ReconnectPolicy::Always`])
//!
//! ## Example
//! ```rust
//! use std::collections::HashMap;
//! use wsvisor::{Config, ReconnectPolicy};
//!
//! let raw: HashMap<String, String> = [
//!     ("HOST", "localhost"),
//!     ("PORT", "8088"),
//!     ("PATH", "/echo"),
//!     ("RECONNECT", "yes"),
//!     ("EXPIRE_TIME", "0"),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v.to_string()))
//! .collect();
//!
//! let cfg = Config::from_map(&raw).unwrap();
//! assert_eq!(cfg.address().unwrap().as_str(), "ws://localhost:8088/echo");
//! assert_eq!(cfg.reconnect, ReconnectPolicy::Always);
//! assert_eq!(cfg.expiry_window(), None);
//! ```

use std::collections::HashMap;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::policies::{BackoffPolicy, JitterPolicy, ReconnectPolicy};

pub const KEY_HOST: &str = "HOST";
pub const KEY_PORT: &str = "PORT";
pub const KEY_PATH: &str = "PATH";
pub const KEY_RECONNECT: &str = "RECONNECT";
pub const KEY_EXPIRE_TIME: &str = "EXPIRE_TIME";
pub const KEY_DIAL_ATTEMPTS: &str = "DIAL_ATTEMPTS";
pub const KEY_JITTER: &str = "JITTER";

/// Settings for one supervised connection.
///
/// The address fields and policies come from the string mapping; the timing
/// fields are programmatic knobs with defaults matching the wire behavior
/// (one ping per second, one expiry tick per second, one-second close wait).
///
/// ## Field semantics
/// - `expire_time`: seconds without a liveness pulse tolerated (`0` = never expire)
/// - `dial_attempts`: failed dials tolerated before giving up (`0` = unbounded)
/// - `grace`: how long cleanup waits for activities before aborting them
#[derive(Clone, Debug)]
pub struct Config {
    /// Remote host name or IP.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// Request path, always starting with `/`.
    pub path: String,
    /// URL scheme used by the transport.
    pub scheme: String,

    /// Whether to dial again after losing the connection.
    pub reconnect: ReconnectPolicy,
    /// Liveness expiry window in seconds (`0` = never expire).
    pub expire_time: u64,
    /// Dial budget; defaults to `expire_time` when `DIAL_ATTEMPTS` is absent.
    pub dial_attempts: u64,

    /// Interval between outbound ping frames.
    pub ping_interval: Duration,
    /// Length of one expiry accumulator step.
    pub expiry_tick: Duration,
    /// How long the close handshake waits for the receive loop to finish.
    pub close_timeout: Duration,
    /// Pause after a failed read before the next one.
    pub read_retry_delay: Duration,
    /// Delay schedule between failed dials.
    pub backoff: BackoffPolicy,
    /// Maximum wait for activities to stop during cleanup.
    pub grace: Duration,
    /// Optional deadline for a single dial; a dial that overruns it counts as failed.
    pub connect_timeout: Option<Duration>,
}

impl Config {
    /// Validates a string mapping and builds the typed configuration.
    pub fn from_map(raw: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let host = required(raw, KEY_HOST)?.to_string();

        let port_raw = required(raw, KEY_PORT)?;
        let port = port_raw
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue {
                key: KEY_PORT,
                value: port_raw.to_string(),
            })?;

        let path = match raw.get(KEY_PATH).map(|p| p.trim()) {
            Some(p) if p.starts_with('/') => p.to_string(),
            Some(p) => format!("/{p}"),
            None => "/".to_string(),
        };

        let reconnect = ReconnectPolicy::from_flag(raw.get(KEY_RECONNECT).map(String::as_str));
        let expire_time = optional_u64(raw, KEY_EXPIRE_TIME)?.unwrap_or(0);
        let dial_attempts = optional_u64(raw, KEY_DIAL_ATTEMPTS)?.unwrap_or(expire_time);

        let mut backoff = BackoffPolicy::default();
        if let Some(name) = raw.get(KEY_JITTER).filter(|v| !v.trim().is_empty()) {
            backoff.jitter =
                JitterPolicy::from_name(name).ok_or_else(|| ConfigError::InvalidValue {
                    key: KEY_JITTER,
                    value: name.to_string(),
                })?;
        }

        let cfg = Self {
            host,
            port,
            path,
            reconnect,
            expire_time,
            dial_attempts,
            backoff,
            ..Self::default()
        };
        cfg.address()?;
        Ok(cfg)
    }

    /// Returns the connection target `scheme://host:port/path`.
    pub fn address(&self) -> Result<Url, ConfigError> {
        let address = format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path);
        Url::parse(&address).map_err(|e| ConfigError::InvalidAddress {
            address,
            reason: e.to_string(),
        })
    }

    /// Returns the expiry window in ticks, or `None` when liveness never expires.
    #[inline]
    pub fn expiry_window(&self) -> Option<u64> {
        match self.expire_time {
            0 => None,
            n => Some(n),
        }
    }

    /// Returns how many failed dials are tolerated before giving up.
    ///
    /// Dialing stops once the failure count exceeds the budget.
    ///
    /// - [`ReconnectPolicy::Never`] → `Some(0)`: the first failure is final
    /// - `dial_attempts = 0` → `None`: dial forever
    #[inline]
    pub fn dial_budget(&self) -> Option<u64> {
        if !self.reconnect.is_enabled() {
            return Some(0);
        }
        match self.dial_attempts {
            0 => None,
            n => Some(n),
        }
    }
}

impl Default for Config {
    /// Default configuration (address fields point at `ws://localhost:80/`):
    ///
    /// - `reconnect = Never`, `expire_time = 0`, `dial_attempts = 0`
    /// - `ping_interval = 1s`, `expiry_tick = 1s`, `close_timeout = 1s`
    /// - `read_retry_delay = 100ms`, `grace = 5s`, no connect timeout
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 80,
            path: "/".to_string(),
            scheme: "ws".to_string(),
            reconnect: ReconnectPolicy::default(),
            expire_time: 0,
            dial_attempts: 0,
            ping_interval: Duration::from_secs(1),
            expiry_tick: Duration::from_secs(1),
            close_timeout: Duration::from_secs(1),
            read_retry_delay: Duration::from_millis(100),
            backoff: BackoffPolicy::default(),
            grace: Duration::from_secs(5),
            connect_timeout: None,
        }
    }
}

fn required<'a>(raw: &'a HashMap<String, String>, key: &'static str) -> Result<&'a str, ConfigError> {
    match raw.get(key).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing { key }),
    }
}

fn optional_u64(raw: &HashMap<String, String>, key: &'static str) -> Result<Option<u64>, ConfigError> {
    match raw.get(key).map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(v) => v.parse::<u64>().map(Some).map_err(|_| ConfigError::InvalidValue {
            key,
            value: v.to_string(),
        }),
    }
}
