use std::io;
use std::net::SocketAddr;

use crate::ConnectionId;

/// Failures below the framing layer.
///
/// Per-connection variants end that connection only; the listener keeps
/// accepting.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The listener socket itself failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// A TCP peer never completed the WebSocket upgrade.
    #[error("WebSocket upgrade from {peer} failed: {reason}")]
    Upgrade { peer: SocketAddr, reason: String },

    /// The socket broke mid-stream.
    #[error("socket error on {id}: {reason}")]
    Socket { id: ConnectionId, reason: String },

    #[error("{0} is already closed")]
    Closed(ConnectionId),
}
