//! # sockbridge-core
//!
//! A uniform asynchronous socket abstraction over pluggable transports.
//!
//! The crate defines three things:
//!
//! - the **lifecycle state machine** every bridged socket follows
//!   (`CLOSED → OPENING → OPENED → CLOSING → CLOSED`), with state-guarded
//!   operation dispatch,
//! - the **transport seam** ([`SocketAdapter`]) that connection backends
//!   implement, and
//! - the **handle** ([`Socket`]) application code talks to, with data /
//!   close / error callbacks registered on its builder.
//!
//! Transports live in sibling crates (`sockbridge-tls` for raw TCP/TLS,
//! `sockbridge-websocket` for WebSocket). Application code swaps transports
//! by passing a different adapter to [`Socket::builder`]; every other call
//! site is unchanged.
//!
//! There is deliberately no protocol framing, buffering, or reconnection
//! here: the bridge forwards byte buffers and lifecycle events and nothing
//! else.

pub mod adapter;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod options;
pub mod socket;
pub mod state;

pub use adapter::SocketAdapter;
pub use endpoint::Endpoint;
pub use error::{SocketError, SocketResult};
pub use event::{EventSink, SocketEvent};
pub use options::SocketOptions;
pub use socket::{Socket, SocketBuilder};
pub use state::SocketState;
