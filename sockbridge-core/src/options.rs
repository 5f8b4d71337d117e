//! Socket tuning options.
//!
//! Options are declared once on the handle and passed to the transport at
//! `open()`. Each transport applies the subset its platform supports and
//! ignores the rest: the TCP/TLS transport honours all of them, the
//! WebSocket transport only the connect timeout (the rest are owned by the
//! WebSocket implementation).

use std::time::Duration;

/// Default connect timeout applied when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default read timeout; a connection idle longer than this is torn down
/// with an error.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-socket tuning knobs.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Enable TCP keep-alive probes.
    pub keep_alive: Option<bool>,
    /// Disable Nagle's algorithm.
    pub no_delay: Option<bool>,
    /// SO_LINGER duration.
    pub linger: Option<Duration>,
    /// Timeout for the connect phase (TCP connect plus handshakes).
    pub connect_timeout: Duration,
    /// Read inactivity timeout. `None` disables the timeout.
    pub read_timeout: Option<Duration>,
    /// SO_RCVBUF size in bytes, applied before connecting.
    pub recv_buffer_size: Option<u32>,
    /// SO_SNDBUF size in bytes, applied before connecting.
    pub send_buffer_size: Option<u32>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            keep_alive: None,
            no_delay: None,
            linger: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            recv_buffer_size: None,
            send_buffer_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timeouts() {
        let opts = SocketOptions::default();
        assert_eq!(opts.connect_timeout, Duration::from_secs(5));
        assert_eq!(opts.read_timeout, Some(Duration::from_secs(60)));
        assert!(opts.keep_alive.is_none());
        assert!(opts.recv_buffer_size.is_none());
    }
}
