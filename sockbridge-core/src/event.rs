//! Transport → handle event delivery.
//!
//! A transport receives an [`EventSink`] when it is opened and reports
//! everything through it:
//!
//! - received bytes ([`EventSink::data`])
//! - transport errors ([`EventSink::error`])
//! - connection teardown ([`EventSink::closed`])
//!
//! The sink is a cheap clone over the state shared with the [`Socket`]
//! handle, so the read-loop task a transport spawns can carry its own copy.
//! `closed` fires the application close callback exactly once per
//! established connection and performs the terminal `→ CLOSED` state
//! transition, whether the close was locally requested, remote, or caused
//! by an error.
//!
//! [`Socket`]: crate::socket::Socket

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use crate::state::SocketState;

/// An event reported by a transport.
///
/// Transports normally call the [`EventSink`] methods directly; this enum
/// exists for transports or tests that buffer events before delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Bytes received from the remote side, uninterpreted.
    Data(Vec<u8>),
    /// The connection is gone. `has_error` is `true` when teardown was
    /// caused by a transport error or an abnormal close.
    Closed { has_error: bool },
    /// A transport error. Errors destroy the connection: transports follow
    /// up with `Closed { has_error: true }`.
    Error(String),
}

/// Application callbacks registered on the socket builder.
#[derive(Default)]
pub(crate) struct Handlers {
    pub on_data: Option<Box<dyn Fn(Vec<u8>) + Send + Sync>>,
    pub on_close: Option<Box<dyn Fn(bool) + Send + Sync>>,
    pub on_error: Option<Box<dyn Fn(String) + Send + Sync>>,
}

/// State shared between the socket handle and the event sinks handed to
/// transports.
pub(crate) struct Shared {
    pub state: Mutex<SocketState>,
    /// Set once the close callback has fired for the current connection;
    /// reset by `open()`.
    pub close_emitted: AtomicBool,
    pub handlers: Handlers,
}

impl Shared {
    pub fn new(handlers: Handlers) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SocketState::Closed),
            close_emitted: AtomicBool::new(false),
            handlers,
        })
    }

    pub fn state(&self) -> SocketState {
        *self.state.lock().unwrap()
    }
}

/// Handle a transport uses to report events back to the socket.
///
/// Cloning is cheap (Arc-based).
#[derive(Clone)]
pub struct EventSink {
    shared: Arc<Shared>,
}

impl EventSink {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Deliver received bytes to the application data callback.
    pub fn data(&self, bytes: Vec<u8>) {
        if let Some(on_data) = &self.shared.handlers.on_data {
            on_data(bytes);
        }
    }

    /// Report a transport error to the application error callback.
    ///
    /// Does not change state by itself; the transport follows up with
    /// [`EventSink::closed`] once the connection is torn down.
    pub fn error(&self, message: impl Into<String>) {
        if let Some(on_error) = &self.shared.handlers.on_error {
            on_error(message.into());
        }
    }

    /// Report connection teardown.
    ///
    /// Transitions the socket to `CLOSED` and fires the application close
    /// callback. Idempotent per connection: a transport may report both a
    /// local close and the subsequent remote EOF without the callback
    /// firing twice.
    pub fn closed(&self, has_error: bool) {
        if self.shared.close_emitted.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.shared.state.lock().unwrap() = SocketState::Closed;
        if let Some(on_close) = &self.shared.handlers.on_close {
            on_close(has_error);
        }
    }

    /// Deliver a buffered [`SocketEvent`].
    pub fn dispatch(&self, event: SocketEvent) {
        match event {
            SocketEvent::Data(bytes) => self.data(bytes),
            SocketEvent::Closed { has_error } => self.closed(has_error),
            SocketEvent::Error(message) => self.error(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn sink_with_close_counter() -> (EventSink, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_in = count.clone();
        let handlers = Handlers {
            on_close: Some(Box::new(move |_| {
                count_in.fetch_add(1, Ordering::SeqCst);
            })),
            ..Handlers::default()
        };
        (EventSink::new(Shared::new(handlers)), count)
    }

    #[test]
    fn closed_fires_callback_once() {
        let (sink, count) = sink_with_close_counter();
        sink.closed(false);
        sink.closed(true);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn closed_transitions_state() {
        let (sink, _count) = sink_with_close_counter();
        *sink.shared.state.lock().unwrap() = SocketState::Opened;
        sink.closed(false);
        assert_eq!(sink.shared.state(), SocketState::Closed);
    }

    #[test]
    fn data_without_handler_is_a_no_op() {
        let sink = EventSink::new(Shared::new(Handlers::default()));
        sink.data(vec![1, 2, 3]);
        sink.error("nobody listening");
    }

    #[test]
    fn dispatch_routes_events() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_in = received.clone();
        let handlers = Handlers {
            on_data: Some(Box::new(move |bytes| {
                received_in.lock().unwrap().push(bytes);
            })),
            ..Handlers::default()
        };
        let sink = EventSink::new(Shared::new(handlers));
        sink.dispatch(SocketEvent::Data(b"abc".to_vec()));
        assert_eq!(received.lock().unwrap().as_slice(), &[b"abc".to_vec()]);
    }
}
