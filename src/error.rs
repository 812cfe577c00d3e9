//! # Error Handling
//!
//! This module defines the recorder's error types and how they propagate.
//! The important property is containment: every failure belongs to exactly one
//! boundary (the listener, or a single connection) and never crosses to
//! sibling connections.
//!
//! ## Error Categories:
//! - **Bind**: the listening socket could not be opened (port in use, etc.).
//!   The listener never reaches its accepting state.
//! - **Stopped**: the socket was closed deliberately through `Recorder::stop()`.
//!   This is not a fault and must never be surfaced to the user as one.
//! - **Connection**: a transport error or idle-read timeout on one connection.
//!   Treated as a disconnect; any non-empty open segment is flushed first.
//! - **Persistence**: a container write failed. The segment's data is lost but
//!   the owning connection keeps running and can record further segments.
//!
//! Malformed frames (too few lines, too short a payload) are not an error
//! value at all: they are dropped silently and the read loop continues.

use std::fmt;

/// Error type for the recorder core.
///
/// ## Usage Example:
/// ```rust,ignore
/// return Err(RecorderError::Bind("address already in use".to_string()));
/// ```
#[derive(Debug)]
pub enum RecorderError {
    /// The listening socket could not be bound
    Bind(String),

    /// Deliberate shutdown via `stop()` - "user action", not a fault
    Stopped,

    /// Transport error or idle timeout on a single connection
    Connection(String),

    /// A finished segment could not be written to disk
    Persistence(String),
}

impl fmt::Display for RecorderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecorderError::Bind(msg) => write!(f, "bind error: {}", msg),
            RecorderError::Stopped => write!(f, "user action"),
            RecorderError::Connection(msg) => write!(f, "connection error: {}", msg),
            RecorderError::Persistence(msg) => write!(f, "persistence error: {}", msg),
        }
    }
}

impl std::error::Error for RecorderError {}

/// Conversion from configuration errors.
///
/// Configuration loading failures surface before the listener starts, so they
/// are reported as bind-stage failures.
impl From<config::ConfigError> for RecorderError {
    fn from(err: config::ConfigError) -> Self {
        RecorderError::Bind(err.to_string())
    }
}

/// Type alias for Results that use the recorder's error type.
pub type RecorderResult<T> = Result<T, RecorderError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// The explicit-stop cause must render as "user action" so the
    /// presentation layer can distinguish it from a genuine fault.
    #[test]
    fn test_stopped_cause_is_user_action() {
        assert_eq!(RecorderError::Stopped.to_string(), "user action");
    }

    #[test]
    fn test_display_includes_cause() {
        let err = RecorderError::Bind("address already in use".to_string());
        assert!(err.to_string().contains("address already in use"));
    }
}
