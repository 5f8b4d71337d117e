//! Error handling for sockbridge operations
//!
//! A single [`SocketError`] enum covers every failure a bridge operation can
//! report, with a [`SocketResult`] alias used throughout the workspace.
//!
//! # Error Categories
//!
//! - **State guards**: [`SocketError::InvalidState`] — the operation was
//!   dispatched while the socket was not in the state it requires. The
//!   socket state is unchanged when this is returned.
//! - **Connection**: [`SocketError::ConnectFailed`] — DNS resolution, TCP
//!   connect, TLS handshake or WebSocket handshake failures.
//! - **Transport**: [`SocketError::WriteFailed`], [`SocketError::CloseFailed`],
//!   [`SocketError::Tls`], [`SocketError::WebSocket`].
//! - **Addressing**: [`SocketError::InvalidEndpoint`].
//! - **I/O**: [`SocketError::Io`] — automatic conversion from
//!   `std::io::Error` so transport code can use `?` directly.

use thiserror::Error;

use crate::state::SocketState;

/// Result alias used by all sockbridge operations.
pub type SocketResult<T> = Result<T, SocketError>;

/// Unified error type for all sockbridge operations.
#[derive(Debug, Error)]
pub enum SocketError {
    /// The operation is not permitted in the socket's current state.
    ///
    /// Guards never change state: the caller can retry once the socket
    /// reaches the required state.
    #[error("Invalid operation for this socket state: {state}")]
    InvalidState {
        /// The operation that was rejected ("open", "write", ...).
        operation: &'static str,
        /// The state the socket was in when the operation was dispatched.
        state: SocketState,
    },

    /// Establishing the connection failed (resolution, connect, handshake).
    #[error("Connection failed to {endpoint}: {reason}")]
    ConnectFailed { endpoint: String, reason: String },

    /// Writing to the underlying transport failed.
    #[error("Write failed: {reason}")]
    WriteFailed { reason: String },

    /// Closing the underlying transport failed.
    #[error("Close failed: {reason}")]
    CloseFailed { reason: String },

    /// TLS-layer failure reported by rustls.
    #[error("TLS error: {reason}")]
    Tls { reason: String },

    /// WebSocket-layer failure reported by tungstenite.
    #[error("WebSocket error: {reason}")]
    WebSocket { reason: String },

    /// An endpoint URL could not be parsed or names an unsupported scheme.
    #[error("Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// I/O operation errors.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SocketError {
    /// Shorthand constructor for [`SocketError::ConnectFailed`].
    pub fn connect_failed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand constructor for [`SocketError::WriteFailed`].
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_display_names_the_state() {
        let err = SocketError::InvalidState {
            operation: "write",
            state: SocketState::Closed,
        };
        assert_eq!(
            err.to_string(),
            "Invalid operation for this socket state: CLOSED"
        );
    }

    #[test]
    fn connect_failed_display_includes_endpoint_and_reason() {
        let err = SocketError::connect_failed("example.com:443", "connection refused");
        assert_eq!(
            err.to_string(),
            "Connection failed to example.com:443: connection refused"
        );
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe gone");
        let err = SocketError::from(io);
        assert!(matches!(err, SocketError::Io { .. }));
        assert!(err.to_string().contains("pipe gone"));
    }
}
