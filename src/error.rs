//! Error types for the qsmart library.

use thiserror::Error;

/// The main error type for qsmart operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket-level failure: unreachable host, reset or closed connection.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// Connection is not established.
    #[error("not connected")]
    NotConnected,

    /// No complete reply arrived within the read timeout.
    #[error("command timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// A wire line could not be encoded or decoded.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The laser answered with `ERROR`, or the reply did not have the expected shape.
    #[error("protocol error: {message}")]
    Protocol {
        /// Offending reply or what was missing from it.
        message: String,
    },

    /// A register value could not be converted to its declared type.
    #[error("cannot parse {register} value {value:?}")]
    Parse {
        /// Register that was read.
        register: String,
        /// Value text as received.
        value: String,
    },

    /// Write to an admin-only register without admin mode.
    #[error("{register} is protected; client is not in admin mode")]
    Permission {
        /// Register that was refused.
        register: String,
    },

    /// Caller-supplied parameters were rejected before anything was sent.
    #[error("invalid parameters: {reason}")]
    Validation {
        /// Which precondition failed.
        reason: String,
    },
}

impl Error {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub(crate) fn timeout(timeout: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Line-level errors on the wire.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Line contains bytes outside the ASCII range.
    #[error("line is not ASCII")]
    NotAscii,

    /// Line exceeds the maximum accepted length.
    #[error("line too long: {size} bytes exceeds maximum {max}")]
    TooLong {
        /// Bytes received.
        size: usize,
        /// Maximum accepted line length.
        max: usize,
    },

    /// Outgoing command carries its own line terminator.
    #[error("command contains a line terminator")]
    EmbeddedTerminator,

    /// Outgoing command is empty.
    #[error("command is empty")]
    Empty,
}

/// Result type alias for qsmart operations.
pub type Result<T> = std::result::Result<T, Error>;
