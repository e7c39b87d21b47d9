//! Error types used by the wsvisor runtime and its transport seam.
//!
//! This module defines three enums:
//!
//! - [`ConfigError`] raised while validating the string configuration mapping.
//! - [`TransportError`] raised by a [`Transport`](crate::Transport) or its connections.
//! - [`RuntimeError`] raised by the session runtime itself (returned from `run`).
//!
//! All of them provide `as_label` (stable snake_case) and `as_message` helpers for logs.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced while building a [`Config`](crate::Config).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent or empty.
    #[error("missing config key {key}")]
    Missing {
        /// The missing key.
        key: &'static str,
    },

    /// A key is present but its value cannot be parsed.
    #[error("invalid value {value:?} for config key {key}")]
    InvalidValue {
        /// The offending key.
        key: &'static str,
        /// The raw value.
        value: String,
    },

    /// Host/port/path do not form a valid connection target.
    #[error("invalid address {address}: {reason}")]
    InvalidAddress {
        /// The address that failed to parse.
        address: String,
        /// Parser message.
        reason: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Missing { .. } => "config_missing",
            ConfigError::InvalidValue { .. } => "config_invalid_value",
            ConfigError::InvalidAddress { .. } => "config_invalid_address",
        }
    }
}

/// # Errors produced by the transport collaborator.
///
/// These are always recoverable from the runtime's point of view: the caller
/// reports them to the fault bus and decides whether to reconnect.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Establishing the connection failed.
    #[error("dial {url} failed: {error}")]
    Dial {
        /// Target address.
        url: String,
        /// The underlying error message.
        error: String,
    },

    /// Writing a frame failed.
    #[error("send failed: {error}")]
    Send {
        /// The underlying error message.
        error: String,
    },

    /// Reading a frame failed.
    #[error("receive failed: {error}")]
    Receive {
        /// The underlying error message.
        error: String,
    },

    /// The operation did not complete in time.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The connection is already closed.
    #[error("connection closed")]
    Closed,
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use wsvisor::TransportError;
    ///
    /// let err = TransportError::Send { error: "broken pipe".into() };
    /// assert_eq!(err.as_label(), "transport_send");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Dial { .. } => "transport_dial",
            TransportError::Send { .. } => "transport_send",
            TransportError::Receive { .. } => "transport_receive",
            TransportError::Timeout { .. } => "transport_timeout",
            TransportError::Closed => "transport_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TransportError::Dial { url, error } => format!("dial {url}: {error}"),
            TransportError::Send { error } => format!("write: {error}"),
            TransportError::Receive { error } => format!("read: {error}"),
            TransportError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TransportError::Closed => "connection closed".to_string(),
        }
    }
}

/// # Errors produced by the wsvisor runtime.
///
/// These end a call to [`Supervisor::run`](crate::Supervisor::run).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The configuration mapping was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// No connection could be established within the dial budget.
    #[error("gave up connecting to {url} after {attempts} attempts: {last}")]
    DialExhausted {
        /// Target address.
        url: String,
        /// Number of dial attempts made.
        attempts: u64,
        /// The last dial error.
        last: TransportError,
    },

    /// The session was shut down while a connection was being acquired.
    #[error("session closed")]
    Closed,

    /// Cleanup grace period was exceeded; remaining activities were aborted.
    #[error("shutdown timeout {grace:?} exceeded; aborted {stuck} activities")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of activities that did not stop in time.
        stuck: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use wsvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: 1 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Config(_) => "runtime_config",
            RuntimeError::DialExhausted { .. } => "runtime_dial_exhausted",
            RuntimeError::Closed => "runtime_closed",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::Config(e) => format!("config: {e}"),
            RuntimeError::DialExhausted {
                url,
                attempts,
                last,
            } => format!("dial exhausted url={url} attempts={attempts} last={last}"),
            RuntimeError::Closed => "session closed".to_string(),
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck activities={stuck}")
            }
        }
    }
}
