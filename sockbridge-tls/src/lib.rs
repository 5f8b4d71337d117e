//! # sockbridge-tls
//!
//! Raw socket transport for sockbridge: plain TCP or TLS over TCP
//! (rustls driven by tokio).
//!
//! ```rust,ignore
//! use sockbridge_core::Socket;
//! use sockbridge_tls::TlsTransport;
//!
//! let socket = Socket::builder(TlsTransport::new())
//!     .on_data(|bytes| handle(bytes))
//!     .on_close(|has_error| cleanup(has_error))
//!     .build();
//! socket.open("device.local", 8443).await?;
//! ```
//!
//! Certificate validation is intentionally disabled — the bridge treats
//! TLS as an opaque encrypted pipe (see [`verify`]). The plaintext mode
//! (`TlsTransport::new().with_tls(false)`) exists for peers that do not
//! speak TLS at all.

pub mod transport;
pub mod verify;

pub use transport::TlsTransport;
pub use verify::insecure_client_config;
