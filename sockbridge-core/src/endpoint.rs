//! Endpoint URL parsing.
//!
//! A small `scheme://host:port/path` parser used to configure transports
//! from a single connection string. Supported schemes:
//!
//! - `tcp` — plaintext TCP (TLS transport with TLS off)
//! - `tls` — TLS over TCP
//! - `ws` / `wss` — WebSocket, default ports 80 / 443
//!
//! IPv6 hosts use the bracketed form (`tls://[::1]:8443`). No credential
//! or query parsing: the bridge API has no use for either.

use crate::error::{SocketError, SocketResult};

/// A parsed connection endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// URL scheme (`tcp`, `tls`, `ws`, `wss`).
    pub scheme: String,
    /// Host name or IP literal.
    pub host: String,
    /// Explicit port, if one was given.
    pub port: Option<u16>,
    /// Path component (WebSocket upgrade path), if one was given.
    pub path: Option<String>,
}

impl Endpoint {
    /// Parse an endpoint string.
    ///
    /// # Example
    ///
    /// ```
    /// use sockbridge_core::Endpoint;
    ///
    /// let ep = Endpoint::parse("wss://gateway.example.com:8443/bridge").unwrap();
    /// assert_eq!(ep.scheme, "wss");
    /// assert_eq!(ep.host, "gateway.example.com");
    /// assert_eq!(ep.port, Some(8443));
    /// assert_eq!(ep.path.as_deref(), Some("/bridge"));
    /// ```
    pub fn parse(url: &str) -> SocketResult<Self> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| SocketError::InvalidEndpoint {
                url: url.to_string(),
                reason: "missing scheme".to_string(),
            })?;

        if !matches!(scheme, "tcp" | "tls" | "ws" | "wss") {
            return Err(SocketError::InvalidEndpoint {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", scheme),
            });
        }

        let (host_port, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], Some(rest[idx..].to_string())),
            None => (rest, None),
        };

        let parse_port = |p: &str| {
            p.parse::<u16>().map_err(|_| SocketError::InvalidEndpoint {
                url: url.to_string(),
                reason: format!("invalid port '{}'", p),
            })
        };

        // IPv6 literals are bracketed (`[::1]:8443`) so the port colon is
        // unambiguous.
        let (host, port) = if let Some(bracketed) = host_port.strip_prefix('[') {
            let (h, after) =
                bracketed
                    .split_once(']')
                    .ok_or_else(|| SocketError::InvalidEndpoint {
                        url: url.to_string(),
                        reason: "unclosed '[' in host".to_string(),
                    })?;
            let port = match after.strip_prefix(':') {
                Some(p) => Some(parse_port(p)?),
                None if after.is_empty() => None,
                None => {
                    return Err(SocketError::InvalidEndpoint {
                        url: url.to_string(),
                        reason: format!("unexpected '{}' after host", after),
                    })
                }
            };
            (h, port)
        } else {
            match host_port.rsplit_once(':') {
                Some((h, p)) => (h, Some(parse_port(p)?)),
                None => (host_port, None),
            }
        };

        if host.is_empty() {
            return Err(SocketError::InvalidEndpoint {
                url: url.to_string(),
                reason: "empty host".to_string(),
            });
        }

        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port,
            path,
        })
    }

    /// Default port for the scheme, where one exists.
    pub fn default_port(&self) -> Option<u16> {
        match self.scheme.as_str() {
            "ws" => Some(80),
            "wss" => Some(443),
            _ => None,
        }
    }

    /// Explicit port, falling back to the scheme default.
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| self.default_port())
    }

    /// `true` for TLS-carrying schemes.
    pub fn is_secure(&self) -> bool {
        matches!(self.scheme.as_str(), "tls" | "wss")
    }
}
