//! Unified error type for the Wordrace server.

use wordrace_protocol::ProtocolError;
use wordrace_room::RoomError;
use wordrace_session::SessionError;
use wordrace_transport::TransportError;
use wordrace_words::WordListError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WordraceError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session bookkeeping error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A rejected room operation.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A word list couldn't be loaded.
    #[error(transparent)]
    WordList(#[from] WordListError),

    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Binding or serving the HTTP listener failed.
    #[error("http server: {0}")]
    Http(#[from] std::io::Error),

    /// The gateway task has stopped.
    #[error("gateway is not running")]
    GatewayClosed,
}
