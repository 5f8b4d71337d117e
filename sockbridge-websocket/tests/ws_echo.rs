//! Loopback integration tests for the WebSocket transport (plain `ws://`
//! mode, driven against a tungstenite echo server).

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use sockbridge_core::{Socket, SocketOptions, SocketState};
use sockbridge_websocket::WsTransport;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    socket: Socket,
    data_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    close_rx: mpsc::UnboundedReceiver<bool>,
}

fn bridge_socket(options: SocketOptions) -> Harness {
    let (data_tx, data_rx) = mpsc::unbounded_channel();
    let (close_tx, close_rx) = mpsc::unbounded_channel();

    let socket = Socket::builder(WsTransport::new().with_tls(false))
        .options(options)
        .on_data(move |bytes| {
            let _ = data_tx.send(bytes);
        })
        .on_close(move |has_error| {
            let _ = close_tx.send(has_error);
        })
        .build();

    Harness {
        socket,
        data_rx,
        close_rx,
    }
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Accept one WebSocket connection and echo frames until the client
/// closes.
async fn echo_server(listener: TcpListener) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

    while let Some(Ok(msg)) = ws.next().await {
        match msg {
            Message::Binary(_) | Message::Text(_) => ws.send(msg).await.unwrap(),
            Message::Close(_) => break,
            _ => {}
        }
    }
}

#[tokio::test]
async fn echo_roundtrip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(echo_server(listener));

    let mut h = bridge_socket(SocketOptions::default());
    h.socket.open("127.0.0.1", addr.port()).await.unwrap();
    assert_eq!(h.socket.state(), SocketState::Opened);

    h.socket.write(b"hello bridge").await.unwrap();
    let echoed = recv(&mut h.data_rx).await;
    assert_eq!(echoed, b"hello bridge");

    h.socket.close().await.unwrap();
    let has_error = recv(&mut h.close_rx).await;
    assert!(!has_error);
    assert_eq!(h.socket.state(), SocketState::Closed);
}

#[tokio::test]
async fn text_frames_surface_as_data() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text("status: ready".into())).await.unwrap();
        // Keep the connection alive until the client closes.
        while let Some(Ok(msg)) = ws.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    let mut h = bridge_socket(SocketOptions::default());
    h.socket.open("127.0.0.1", addr.port()).await.unwrap();

    let bytes = recv(&mut h.data_rx).await;
    assert_eq!(bytes, b"status: ready");

    h.socket.force_close().await.unwrap();
}

#[tokio::test]
async fn normal_close_frame_fires_clean_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
    });

    let mut h = bridge_socket(SocketOptions::default());
    h.socket.open("127.0.0.1", addr.port()).await.unwrap();

    let has_error = recv(&mut h.close_rx).await;
    assert!(!has_error);
    assert_eq!(h.socket.state(), SocketState::Closed);
}

#[tokio::test]
async fn abnormal_close_code_reports_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.close(Some(CloseFrame {
            code: CloseCode::Error,
            reason: "backend fault".into(),
        }))
        .await
        .unwrap();
    });

    let mut h = bridge_socket(SocketOptions::default());
    h.socket.open("127.0.0.1", addr.port()).await.unwrap();

    let has_error = recv(&mut h.close_rx).await;
    assert!(has_error);
    assert_eq!(h.socket.state(), SocketState::Closed);
}

#[tokio::test]
async fn shutdown_write_reports_success_and_keeps_data_flowing() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(echo_server(listener));

    let mut h = bridge_socket(SocketOptions::default());
    h.socket.open("127.0.0.1", addr.port()).await.unwrap();

    // Half-close does not exist for WebSocket; the call succeeds and
    // the connection stays fully usable.
    h.socket.shutdown_write().await.unwrap();
    assert_eq!(h.socket.state(), SocketState::Opened);

    h.socket.write(b"still here").await.unwrap();
    let echoed = recv(&mut h.data_rx).await;
    assert_eq!(echoed, b"still here");

    h.socket.force_close().await.unwrap();
}

#[tokio::test]
async fn remote_close_releases_the_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Server closes right away and then waits for the connection to die.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut h = bridge_socket(SocketOptions::default());
    h.socket.open("127.0.0.1", addr.port()).await.unwrap();

    let has_error = recv(&mut h.close_rx).await;
    assert!(!has_error);

    // The transport tears down its halves when the read loop reports the
    // close, without waiting for a close() call or a reopen, so the
    // server sees the connection drop while the handle is still alive.
    tokio::time::timeout(RECV_TIMEOUT, server)
        .await
        .expect("client kept the dead connection open")
        .unwrap();
    drop(h);
}

#[tokio::test]
async fn idle_connection_ignores_read_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Server accepts the upgrade and then stays silent.
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    let options = SocketOptions {
        read_timeout: Some(Duration::from_millis(100)),
        ..SocketOptions::default()
    };
    let mut h = bridge_socket(options);
    h.socket.open("127.0.0.1", addr.port()).await.unwrap();

    // A healthy idle connection outlives the read timeout untouched.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.socket.state(), SocketState::Opened);
    assert!(h.close_rx.try_recv().is_err());

    h.socket.force_close().await.unwrap();
}

#[tokio::test]
async fn connect_refused_returns_error_and_closed_state() {
    // Bind-then-drop to get a port nothing is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let h = bridge_socket(SocketOptions::default());
    let err = h.socket.open("127.0.0.1", addr.port()).await.unwrap_err();
    assert!(err.to_string().contains("Connection failed"));
    assert_eq!(h.socket.state(), SocketState::Closed);
}
