//! Error types for the session layer.

use wordrace_protocol::PlayerId;

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given player. The connection already
    /// closed, or never registered.
    #[error("session not found for player {0}")]
    NotFound(PlayerId),

    /// A session for this player id is already registered.
    #[error("player {0} already has an active session")]
    AlreadyConnected(PlayerId),
}
