//! Error types for the protocol layer.

/// Errors raised while turning frames into messages or back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, unknown request type, or a
    /// field of the wrong type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but isn't something the server accepts, e.g. a
    /// binary frame that isn't UTF-8.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
