//! Connection lifecycle states.
//!
//! Every socket moves through the same four-state lifecycle regardless of
//! transport:
//!
//! ```text
//! CLOSED → OPENING → OPENED → CLOSING → CLOSED
//! ```
//!
//! Two extra transitions exist for failure paths: `OPENING → CLOSED` when the
//! connect attempt fails, and `OPENED → CLOSED` when the remote side closes
//! or the transport errors out.

use crate::error::{SocketError, SocketResult};

/// Lifecycle state of a socket handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// No connection. The only state `open()` is accepted in.
    Closed,
    /// A connect attempt is in flight.
    Opening,
    /// Connected; `write()`, `shutdown_write()` and `close()` are accepted.
    Opened,
    /// A local `close()` was issued and the transport is shutting down.
    Closing,
}

impl SocketState {
    /// Guard an operation against the current state.
    ///
    /// Returns [`SocketError::InvalidState`] without side effects when the
    /// socket is not in `required`.
    pub fn ensure(self, required: SocketState, operation: &'static str) -> SocketResult<()> {
        if self == required {
            Ok(())
        } else {
            Err(SocketError::InvalidState {
                operation,
                state: self,
            })
        }
    }
}

impl core::fmt::Display for SocketState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            SocketState::Closed => "CLOSED",
            SocketState::Opening => "OPENING",
            SocketState::Opened => "OPENED",
            SocketState::Closing => "CLOSING",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_passes_in_required_state() {
        assert!(SocketState::Opened
            .ensure(SocketState::Opened, "write")
            .is_ok());
    }

    #[test]
    fn ensure_rejects_other_states() {
        for state in [
            SocketState::Closed,
            SocketState::Opening,
            SocketState::Closing,
        ] {
            let err = state.ensure(SocketState::Opened, "write").unwrap_err();
            match err {
                SocketError::InvalidState {
                    operation,
                    state: reported,
                } => {
                    assert_eq!(operation, "write");
                    assert_eq!(reported, state);
                }
                other => panic!("expected InvalidState, got {other:?}"),
            }
        }
    }

    #[test]
    fn display_uses_uppercase_names() {
        assert_eq!(SocketState::Closed.to_string(), "CLOSED");
        assert_eq!(SocketState::Opening.to_string(), "OPENING");
        assert_eq!(SocketState::Opened.to_string(), "OPENED");
        assert_eq!(SocketState::Closing.to_string(), "CLOSING");
    }
}
