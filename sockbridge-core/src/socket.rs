//! The uniform socket handle.
//!
//! [`Socket`] wraps any [`SocketAdapter`] behind one call surface:
//! `open` / `write` / `shutdown_write` / `close`, with data, close and
//! error callbacks registered up front on the builder. Every operation is
//! guarded by the four-state lifecycle; an operation dispatched in the
//! wrong state returns [`SocketError::InvalidState`] and leaves both the
//! state and the transport untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! use sockbridge_core::Socket;
//! use sockbridge_tls::TlsTransport;
//!
//! let socket = Socket::builder(TlsTransport::new())
//!     .on_data(|bytes| println!("got {} bytes", bytes.len()))
//!     .on_close(|has_error| println!("closed (error: {has_error})"))
//!     .on_error(|msg| eprintln!("socket error: {msg}"))
//!     .build();
//!
//! socket.open("device.local", 8443).await?;
//! socket.write(b"hello").await?;
//! socket.close().await?;
//! ```
//!
//! [`SocketError::InvalidState`]: crate::error::SocketError::InvalidState

use std::sync::{atomic::Ordering, Arc};

use uuid::Uuid;

use crate::{
    adapter::SocketAdapter,
    endpoint::Endpoint,
    error::{SocketError, SocketResult},
    event::{EventSink, Handlers, Shared},
    options::SocketOptions,
    state::SocketState,
};

// ════════════════════════════════════════════════════════════════════
// Builder
// ════════════════════════════════════════════════════════════════════

/// Builder for [`Socket`].
///
/// The adapter is mandatory and supplied up front; callbacks and options
/// are optional.
pub struct SocketBuilder {
    adapter: Box<dyn SocketAdapter>,
    options: SocketOptions,
    handlers: Handlers,
}

impl SocketBuilder {
    /// Register the data callback, invoked with each received byte buffer.
    pub fn on_data(mut self, f: impl Fn(Vec<u8>) + Send + Sync + 'static) -> Self {
        self.handlers.on_data = Some(Box::new(f));
        self
    }

    /// Register the close callback.
    ///
    /// Invoked exactly once per established connection; the flag is `true`
    /// when the connection was torn down by an error or an abnormal close.
    pub fn on_close(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.handlers.on_close = Some(Box::new(f));
        self
    }

    /// Register the error callback.
    pub fn on_error(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.handlers.on_error = Some(Box::new(f));
        self
    }

    /// Override the default [`SocketOptions`].
    pub fn options(mut self, options: SocketOptions) -> Self {
        self.options = options;
        self
    }

    /// Finish building the socket. The socket starts in `CLOSED`.
    pub fn build(self) -> Socket {
        Socket {
            socket_key: Uuid::new_v4(),
            shared: Shared::new(self.handlers),
            adapter: self.adapter,
            options: self.options,
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Socket
// ════════════════════════════════════════════════════════════════════

/// A transport-agnostic socket handle.
pub struct Socket {
    socket_key: Uuid,
    shared: Arc<Shared>,
    adapter: Box<dyn SocketAdapter>,
    options: SocketOptions,
}

impl Socket {
    /// Start building a socket over the given transport adapter.
    pub fn builder(adapter: impl SocketAdapter + 'static) -> SocketBuilder {
        SocketBuilder {
            adapter: Box::new(adapter),
            options: SocketOptions::default(),
            handlers: Handlers::default(),
        }
    }

    /// Unique identity of this socket handle.
    pub fn socket_key(&self) -> Uuid {
        self.socket_key
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SocketState {
        self.shared.state()
    }

    /// Open a connection to `host:port`.
    ///
    /// Requires `CLOSED`. The socket is `OPENING` while the connect attempt
    /// is in flight and `OPENED` once the adapter reports success; a failed
    /// attempt returns the socket to `CLOSED` and surfaces the error.
    pub async fn open(&self, host: &str, port: u16) -> SocketResult<()> {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.ensure(SocketState::Closed, "open")?;
            *state = SocketState::Opening;
        }
        // New connection: re-arm the once-per-connection close event.
        self.shared.close_emitted.store(false, Ordering::SeqCst);

        let sink = EventSink::new(self.shared.clone());
        match self.adapter.open(host, port, &self.options, sink).await {
            Ok(()) => {
                let mut state = self.shared.state.lock().unwrap();
                // The connection may already be gone if the remote closed
                // between the handshake and this point.
                if *state == SocketState::Opening {
                    *state = SocketState::Opened;
                }
                Ok(())
            }
            Err(e) => {
                let mut state = self.shared.state.lock().unwrap();
                if *state == SocketState::Opening {
                    *state = SocketState::Closed;
                }
                Err(e)
            }
        }
    }

    /// Open a connection described by a parsed [`Endpoint`].
    ///
    /// The endpoint must carry a port or have a scheme default.
    pub async fn open_endpoint(&self, endpoint: &Endpoint) -> SocketResult<()> {
        let port = endpoint
            .effective_port()
            .ok_or_else(|| SocketError::InvalidEndpoint {
                url: format!("{}://{}", endpoint.scheme, endpoint.host),
                reason: "no port given and scheme has no default".to_string(),
            })?;
        self.open(&endpoint.host, port).await
    }

    /// Send a byte buffer. Requires `OPENED`.
    pub async fn write(&self, data: &[u8]) -> SocketResult<()> {
        self.state().ensure(SocketState::Opened, "write")?;
        self.adapter.write(data).await
    }

    /// Shut down the write side of the connection. Requires `OPENED`.
    ///
    /// The read side stays open; data and the eventual close event keep
    /// being delivered.
    pub async fn shutdown_write(&self) -> SocketResult<()> {
        self.state().ensure(SocketState::Opened, "shutdownWrite")?;
        self.adapter.shutdown_write().await
    }

    /// Close the connection. Requires `OPENED`.
    ///
    /// Moves to `CLOSING` and delegates teardown to the adapter; the
    /// terminal `CLOSED` transition and the close callback arrive with the
    /// transport's close event.
    pub async fn close(&self) -> SocketResult<()> {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.ensure(SocketState::Opened, "close")?;
            *state = SocketState::Closing;
        }
        self.adapter.close().await
    }

    /// Close without the state guard.
    ///
    /// Allows tearing down a socket stuck in `OPENING` or `CLOSING`.
    /// Calling this on a `CLOSED` socket is a no-op.
    pub async fn force_close(&self) -> SocketResult<()> {
        {
            let mut state = self.shared.state.lock().unwrap();
            if *state == SocketState::Closed {
                return Ok(());
            }
            *state = SocketState::Closing;
        }
        self.adapter.close().await?;

        // With no live connection (forced teardown mid-OPENING) the adapter
        // has no close event to report; finish the transition here so the
        // socket does not stay stuck in CLOSING.
        let mut state = self.shared.state.lock().unwrap();
        if *state == SocketState::Closing {
            *state = SocketState::Closed;
        }
        Ok(())
    }
}

impl core::fmt::Debug for Socket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Socket")
            .field("socket_key", &self.socket_key)
            .field("state", &self.state())
            .finish()
    }
}

// ════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════
