//! Socket layer for Wordrace.
//!
//! The gateway only sees byte frames: [`Transport`] hands out connections,
//! and each [`Connection`] moves whole frames in both directions. Framing,
//! codecs, and player identity all live above this crate.
//!
//! The WebSocket implementation sits behind the default `websocket` feature.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Process-unique id of one accepted socket. Also serves as the player id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A listener producing connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Next connection that completed its upgrade.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Bound address; useful when listening on port 0.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// One client socket.
///
/// The server reads from one task and writes from another, so `send` and
/// `recv` take `&self` and must not block each other.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Next frame, or `Ok(None)` once the peer has closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_round_trips_raw_value() {
        assert_eq!(ConnectionId::new(42).into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display_is_prefixed() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_closed_error_names_connection() {
        let err = TransportError::Closed(ConnectionId::new(9));
        assert_eq!(err.to_string(), "conn-9 is already closed");
    }

    #[test]
    fn test_upgrade_error_names_peer() {
        let err = TransportError::Upgrade {
            peer: "127.0.0.1:4000".parse().unwrap(),
            reason: "timed out".into(),
        };
        assert_eq!(
            err.to_string(),
            "WebSocket upgrade from 127.0.0.1:4000 failed: timed out"
        );
    }
}
