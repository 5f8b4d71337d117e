//! The transport seam.
//!
//! [`SocketAdapter`] is the only surface a transport has to implement.
//! Application code builds a [`Socket`] with whichever adapter it wants and
//! every other call site stays identical — swapping raw TLS for WebSocket
//! is a one-line change at construction.
//!
//! Adapters own their connection objects and any background read tasks;
//! everything they observe flows back through the [`EventSink`] they were
//! handed at `open()`. The state machine lives in the handle, not here: an
//! adapter is never called in a state its operation is invalid for.
//!
//! [`Socket`]: crate::socket::Socket

use async_trait::async_trait;

use crate::{error::SocketResult, event::EventSink, options::SocketOptions};

/// A pluggable connection backend.
#[async_trait]
pub trait SocketAdapter: Send + Sync {
    /// Establish a connection to `host:port`.
    ///
    /// The adapter keeps `sink` (or clones of it) for the lifetime of the
    /// connection and reports received data, errors and the eventual close
    /// through it. Returning `Err` means no connection was established and
    /// no events will follow.
    async fn open(
        &self,
        host: &str,
        port: u16,
        options: &SocketOptions,
        sink: EventSink,
    ) -> SocketResult<()>;

    /// Send a byte buffer. No framing is added; bytes are passed through
    /// to the underlying transport as-is.
    async fn write(&self, data: &[u8]) -> SocketResult<()>;

    /// Half-close: shut down the write side while keeping the read side
    /// open. Transports that cannot half-close report success and log.
    async fn shutdown_write(&self) -> SocketResult<()>;

    /// Tear the connection down. The close event (exactly one per
    /// connection) is reported through the sink, not by this method.
    async fn close(&self) -> SocketResult<()>;
}
