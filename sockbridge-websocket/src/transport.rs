//! WebSocket transport implementation.
//!
//! [`WsTransport`] dials a `ws://` or `wss://` endpoint with
//! `tokio-tungstenite` and runs two cooperating tasks per connection:
//!
//! ```text
//! open() ──► connect_async ──► split
//!                          ├─ write loop task (mpsc receiver → WS sink)
//!                          └─ read loop task  (WS stream → EventSink)
//! ```
//!
//! Binary and text frames both surface as data events carrying the raw
//! payload bytes. A close frame with a code other than `1000 Normal`
//! counts as an abnormal close and is reported with `has_error = true`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};

use sockbridge_core::{
    Endpoint, EventSink, SocketAdapter, SocketError, SocketOptions, SocketResult,
};
use sockbridge_tls::insecure_client_config;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

// ════════════════════════════════════════════════════════════════════
// Transport
// ════════════════════════════════════════════════════════════════════

/// WebSocket transport speaking `ws://` or `wss://`.
///
/// TLS is on by default (`wss`). As with the raw transport, certificate
/// validation is disabled in the secure case; the handshake is delegated
/// to rustls through tungstenite's connector hook.
pub struct WsTransport {
    use_tls: bool,
    /// Request path appended to the URL, `/` by default.
    path: String,
    conn: Arc<Mutex<Option<WsConn>>>,
    /// Bumped per `open()` so a finished read loop only releases its own
    /// connection, never a successor's.
    generation: AtomicU64,
}

/// Live connection state, dropped by `close()` or by the read loop when
/// the connection dies remotely.
struct WsConn {
    write_tx: mpsc::UnboundedSender<Message>,
    write_task: JoinHandle<()>,
    read_task: JoinHandle<()>,
    sink: EventSink,
    generation: u64,
}

impl WsTransport {
    /// Create a WebSocket transport with default settings (`wss`).
    pub fn new() -> Self {
        Self {
            use_tls: true,
            path: "/".to_string(),
            conn: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// Enable or disable TLS. With TLS off the transport dials `ws://`.
    pub fn with_tls(mut self, enabled: bool) -> Self {
        self.use_tls = enabled;
        self
    }

    /// Set the request path used in the connection URL.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        self
    }

    /// Configure a transport from a parsed endpoint (`ws://` or `wss://`).
    pub fn from_endpoint(endpoint: &Endpoint) -> SocketResult<Self> {
        let transport = match endpoint.scheme.as_str() {
            "wss" => Self::new(),
            "ws" => Self::new().with_tls(false),
            other => {
                return Err(SocketError::InvalidEndpoint {
                    url: format!("{}://{}", other, endpoint.host),
                    reason: "WebSocket transport handles ws:// and wss:// endpoints".to_string(),
                })
            }
        };
        Ok(match &endpoint.path {
            Some(path) => transport.with_path(path.clone()),
            None => transport,
        })
    }

    fn url(&self, host: &str, port: u16) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{}://{}:{}{}", scheme, host, port, self.path)
    }

    async fn connect(&self, url: &str, options: &SocketOptions) -> SocketResult<WsStream> {
        let dial = async {
            if self.use_tls {
                let connector = Connector::Rustls(insecure_client_config());
                tokio_tungstenite::connect_async_tls_with_config(url, None, false, Some(connector))
                    .await
            } else {
                tokio_tungstenite::connect_async(url).await
            }
        };

        match tokio::time::timeout(options.connect_timeout, dial).await {
            Ok(Ok((stream, _response))) => Ok(stream),
            Ok(Err(e)) => Err(SocketError::connect_failed(url, e.to_string())),
            Err(_) => Err(SocketError::connect_failed(
                url,
                format!(
                    "connect timed out after {}ms",
                    options.connect_timeout.as_millis()
                ),
            )),
        }
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocketAdapter for WsTransport {
    async fn open(
        &self,
        host: &str,
        port: u16,
        options: &SocketOptions,
        sink: EventSink,
    ) -> SocketResult<()> {
        let url = self.url(host, port);
        let stream = self.connect(&url, options).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(%url, "websocket opened");

        let (ws_write, ws_read) = stream.split();
        let (write_tx, write_rx) = mpsc::unbounded_channel::<Message>();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        // Hold the slot across the spawn so the read loop cannot observe
        // it before the connection is stored.
        let mut conn = self.conn.lock().await;
        if let Some(stale) = conn.take() {
            // A previous connection was never closed through this adapter;
            // its loops are dead weight at this point.
            stale.write_task.abort();
            stale.read_task.abort();
        }
        let write_task = tokio::spawn(run_write_loop(ws_write, write_rx));
        let read_task = tokio::spawn(run_read_loop(
            ws_read,
            sink.clone(),
            self.conn.clone(),
            generation,
        ));
        *conn = Some(WsConn {
            write_tx,
            write_task,
            read_task,
            sink,
            generation,
        });

        Ok(())
    }

    async fn write(&self, data: &[u8]) -> SocketResult<()> {
        let conn = self.conn.lock().await;
        let conn = conn
            .as_ref()
            .ok_or_else(|| SocketError::write_failed("no open connection"))?;

        conn.write_tx
            .send(Message::Binary(data.to_vec().into()))
            .map_err(|_| SocketError::write_failed("write loop has stopped"))?;
        Ok(())
    }

    async fn shutdown_write(&self) -> SocketResult<()> {
        // WebSocket has no half-close. Report success so callers shared
        // with the raw transport keep working.
        #[cfg(feature = "tracing")]
        tracing::warn!("shutdownWrite is not supported on WebSocket connections");
        Ok(())
    }

    async fn close(&self) -> SocketResult<()> {
        let mut guard = self.conn.lock().await;
        let Some(conn) = guard.take() else {
            return Ok(());
        };
        drop(guard);

        // Best effort: the write loop may already be gone.
        let _ = conn.write_tx.send(Message::Close(None));

        conn.read_task.abort();
        conn.write_task.abort();
        conn.sink.closed(false);

        #[cfg(feature = "tracing")]
        tracing::debug!("websocket closed");
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════
// Write loop
// ════════════════════════════════════════════════════════════════════

async fn run_write_loop(
    mut ws_write: futures_util::stream::SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        let is_close = matches!(msg, Message::Close(_));
        if ws_write.send(msg).await.is_err() {
            #[cfg(feature = "tracing")]
            tracing::debug!("websocket send failed, stopping write loop");
            break;
        }
        if is_close {
            let _ = ws_write.flush().await;
            break;
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Read loop
// ════════════════════════════════════════════════════════════════════

async fn run_read_loop(
    ws_read: futures_util::stream::SplitStream<WsStream>,
    sink: EventSink,
    conn_slot: Arc<Mutex<Option<WsConn>>>,
    generation: u64,
) {
    read_until_closed(ws_read, sink).await;

    // The connection is finished; release it right away instead of
    // keeping the write side around until the next open() or drop.
    let mut conn = conn_slot.lock().await;
    if conn.as_ref().is_some_and(|c| c.generation == generation) {
        if let Some(dead) = conn.take() {
            dead.write_task.abort();
        }
    }
}

// Of the socket options only the connect timeout applies here: an idle
// WebSocket connection is kept open indefinitely, the protocol has its
// own ping/pong liveness.
async fn read_until_closed(mut ws_read: futures_util::stream::SplitStream<WsStream>, sink: EventSink) {
    loop {
        let Some(result) = ws_read.next().await else {
            // Stream ended without a close frame.
            sink.closed(false);
            return;
        };

        match result {
            Ok(Message::Binary(bytes)) => sink.data(bytes.to_vec()),
            Ok(Message::Text(text)) => sink.data(text.as_bytes().to_vec()),
            Ok(Message::Close(frame)) => {
                let has_error = frame
                    .as_ref()
                    .map(|f| f.code != CloseCode::Normal)
                    .unwrap_or(false);
                #[cfg(feature = "tracing")]
                tracing::debug!(has_error, "received close frame");
                sink.closed(has_error);
                return;
            }
            // Ping/pong frames are answered by tungstenite itself.
            Ok(_) => {}
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("websocket read error: {}", e);
                sink.error(e.to_string());
                sink.closed(true);
                return;
            }
        }
    }
}
