//! Converts wire messages to and from bytes.
//!
//! The gateway only depends on the [`Codec`] trait, so swapping JSON for a
//! binary format later touches nothing but this file.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `DeserializeOwned` keeps decoded values independent of the input buffer,
/// which is dropped as soon as a frame is handled.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or don't
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. Browser clients speak this.
///
/// ```rust
/// use wordrace_protocol::{ClientEnvelope, ClientMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let env: ClientEnvelope = codec
///     .decode(br#"{"requestId":1,"message":{"type":"start_game"}}"#)
///     .unwrap();
/// assert_eq!(env.message, ClientMessage::StartGame);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
