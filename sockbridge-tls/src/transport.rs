//! Raw TCP/TLS transport implementation.
//!
//! [`TlsTransport`] connects a plain `TcpStream`, optionally wraps it in a
//! rustls session, and spawns a single read-loop task:
//!
//! ```text
//! open() ──► TcpSocket::connect ──► rustls handshake ──► split
//!                                                    ├─ write half (held for write/shutdown_write/close)
//!                                                    └─ read half  ──► read loop task ──► EventSink
//! ```
//!
//! The read loop delivers each received chunk as a data event, EOF as a
//! clean close, and read errors as an error followed by an error close.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;

use sockbridge_core::{
    Endpoint, EventSink, SocketAdapter, SocketError, SocketOptions, SocketResult,
};

use crate::verify::insecure_client_config;

/// Read-loop chunk size.
const READ_BUFFER_SIZE: usize = 16 * 1024;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

// ════════════════════════════════════════════════════════════════════
// Transport
// ════════════════════════════════════════════════════════════════════

/// Raw socket transport: TCP with an optional TLS layer.
///
/// TLS is on by default. Certificate validation is disabled (see
/// [`crate::verify`]); the handshake itself is delegated entirely to
/// rustls.
pub struct TlsTransport {
    use_tls: bool,
    /// SNI override for hosts that are IP literals or that present a
    /// certificate for a different name.
    server_name: Option<String>,
    conn: Arc<Mutex<Option<Conn>>>,
    /// Bumped per `open()` so a finished read loop only releases its own
    /// connection, never a successor's.
    generation: AtomicU64,
}

/// Live connection state, dropped by `close()` or by the read loop when
/// the connection dies remotely.
struct Conn {
    writer: BoxedWriter,
    read_task: JoinHandle<()>,
    sink: EventSink,
    generation: u64,
}

impl TlsTransport {
    /// Create a TLS transport with default settings (TLS enabled).
    pub fn new() -> Self {
        Self {
            use_tls: true,
            server_name: None,
            conn: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// Enable or disable the TLS layer. With TLS off this is a plain TCP
    /// socket.
    pub fn with_tls(mut self, enabled: bool) -> Self {
        self.use_tls = enabled;
        self
    }

    /// Override the SNI server name sent during the handshake.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Configure a transport from a parsed endpoint (`tcp://` or `tls://`).
    pub fn from_endpoint(endpoint: &Endpoint) -> SocketResult<Self> {
        match endpoint.scheme.as_str() {
            "tls" => Ok(Self::new()),
            "tcp" => Ok(Self::new().with_tls(false)),
            other => Err(SocketError::InvalidEndpoint {
                url: format!("{}://{}", other, endpoint.host),
                reason: "TLS transport handles tcp:// and tls:// endpoints".to_string(),
            }),
        }
    }

    async fn connect_tcp(
        &self,
        host: &str,
        port: u16,
        options: &SocketOptions,
    ) -> SocketResult<TcpStream> {
        let endpoint = format!("{}:{}", host, port);

        let addr = lookup_host((host, port))
            .await
            .map_err(|e| SocketError::connect_failed(&endpoint, e.to_string()))?
            .next()
            .ok_or_else(|| SocketError::connect_failed(&endpoint, "no addresses resolved"))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };

        // Buffer sizes and keep-alive must be set before the connect.
        if let Some(keep_alive) = options.keep_alive {
            socket.set_keepalive(keep_alive)?;
        }
        if let Some(size) = options.recv_buffer_size {
            socket.set_recv_buffer_size(size)?;
        }
        if let Some(size) = options.send_buffer_size {
            socket.set_send_buffer_size(size)?;
        }

        let stream = match tokio::time::timeout(options.connect_timeout, socket.connect(addr)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(SocketError::connect_failed(&endpoint, e.to_string())),
            Err(_) => {
                return Err(SocketError::connect_failed(
                    &endpoint,
                    format!(
                        "connect timed out after {}ms",
                        options.connect_timeout.as_millis()
                    ),
                ))
            }
        };

        if let Some(no_delay) = options.no_delay {
            stream.set_nodelay(no_delay)?;
        }
        if let Some(linger) = options.linger {
            stream.set_linger(Some(linger))?;
        }

        Ok(stream)
    }
}

impl Default for TlsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocketAdapter for TlsTransport {
    async fn open(
        &self,
        host: &str,
        port: u16,
        options: &SocketOptions,
        sink: EventSink,
    ) -> SocketResult<()> {
        let stream = self.connect_tcp(host, port, options).await?;

        let (reader, writer): (BoxedReader, BoxedWriter) = if self.use_tls {
            let name = self.server_name.clone().unwrap_or_else(|| host.to_string());
            let server_name =
                ServerName::try_from(name.clone()).map_err(|_| SocketError::Tls {
                    reason: format!("invalid server name '{}'", name),
                })?;

            let connector = TlsConnector::from(insecure_client_config());
            let tls_stream = connector
                .connect(server_name, stream)
                .await
                .map_err(|e| {
                    SocketError::connect_failed(
                        format!("{}:{}", host, port),
                        format!("TLS handshake failed: {}", e),
                    )
                })?;

            let (r, w) = tokio::io::split(tls_stream);
            (Box::new(r), Box::new(w))
        } else {
            let (r, w) = tokio::io::split(stream);
            (Box::new(r), Box::new(w))
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(host, port, tls = self.use_tls, "socket opened");

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        // Hold the slot across the spawn so the read loop cannot observe
        // it before the connection is stored.
        let mut conn = self.conn.lock().await;
        if let Some(stale) = conn.take() {
            // A previous connection was never closed through this adapter;
            // its read loop is dead weight at this point.
            stale.read_task.abort();
        }
        let read_task = tokio::spawn(run_read_loop(
            reader,
            sink.clone(),
            options.read_timeout,
            self.conn.clone(),
            generation,
        ));
        *conn = Some(Conn {
            writer,
            read_task,
            sink,
            generation,
        });

        Ok(())
    }

    async fn write(&self, data: &[u8]) -> SocketResult<()> {
        let mut conn = self.conn.lock().await;
        let conn = conn
            .as_mut()
            .ok_or_else(|| SocketError::write_failed("no open connection"))?;

        conn.writer
            .write_all(data)
            .await
            .map_err(|e| SocketError::write_failed(e.to_string()))?;
        conn.writer
            .flush()
            .await
            .map_err(|e| SocketError::write_failed(e.to_string()))?;
        Ok(())
    }

    async fn shutdown_write(&self) -> SocketResult<()> {
        let mut conn = self.conn.lock().await;
        let conn = conn
            .as_mut()
            .ok_or_else(|| SocketError::write_failed("no open connection"))?;

        // TCP FIN — or close_notify plus FIN in TLS mode. The read side
        // stays live and keeps feeding the sink.
        conn.writer.shutdown().await?;

        #[cfg(feature = "tracing")]
        tracing::debug!("write side shut down");
        Ok(())
    }

    async fn close(&self) -> SocketResult<()> {
        let mut guard = self.conn.lock().await;
        let Some(mut conn) = guard.take() else {
            return Ok(());
        };
        drop(guard);

        // Best effort: the peer may already be gone.
        let _ = conn.writer.shutdown().await;
        conn.read_task.abort();
        conn.sink.closed(false);

        #[cfg(feature = "tracing")]
        tracing::debug!("socket closed");
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════
// Read loop
// ════════════════════════════════════════════════════════════════════

async fn run_read_loop(
    reader: BoxedReader,
    sink: EventSink,
    read_timeout: Option<std::time::Duration>,
    conn_slot: Arc<Mutex<Option<Conn>>>,
    generation: u64,
) {
    read_until_closed(reader, sink, read_timeout).await;

    // The connection is finished; release the write half right away
    // instead of keeping it around until the next open() or drop.
    let mut conn = conn_slot.lock().await;
    if conn.as_ref().is_some_and(|c| c.generation == generation) {
        conn.take();
    }
}

async fn read_until_closed(
    mut reader: BoxedReader,
    sink: EventSink,
    read_timeout: Option<std::time::Duration>,
) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let result = match read_timeout {
            Some(timeout) => {
                match tokio::time::timeout(timeout, reader.read(&mut buf)).await {
                    Ok(result) => result,
                    Err(_) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(timeout_ms = timeout.as_millis() as u64, "read timed out");
                        sink.error(format!(
                            "read timed out after {}ms",
                            timeout.as_millis()
                        ));
                        sink.closed(true);
                        return;
                    }
                }
            }
            None => reader.read(&mut buf).await,
        };

        match result {
            Ok(0) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("remote closed the connection");
                sink.closed(false);
                return;
            }
            Ok(n) => sink.data(buf[..n].to_vec()),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("read error: {}", e);
                sink.error(e.to_string());
                sink.closed(true);
                return;
            }
        }
    }
}
