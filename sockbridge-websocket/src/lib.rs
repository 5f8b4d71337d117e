//! WebSocket transport for sockbridge.
//!
//! Provides [`WsTransport`], a [`sockbridge_core::SocketAdapter`] backed by
//! `tokio-tungstenite`. Payloads map to binary WebSocket messages on the
//! way out; inbound binary and text frames both surface as data events.
//!
//! ```rust,ignore
//! use sockbridge_core::Socket;
//! use sockbridge_websocket::WsTransport;
//!
//! let socket = Socket::builder(WsTransport::new().with_path("/bridge"))
//!     .on_data(|bytes| println!("got {} bytes", bytes.len()))
//!     .build();
//! socket.open("device.local", 8443).await?;
//! ```

pub mod transport;

pub use transport::WsTransport;
