//! Wire protocol for Wordrace.
//!
//! - **Types** ([`RoomCode`], [`PlayerId`], [`RoomSnapshot`], ...): identity
//!   and the public projection of room state.
//! - **Messages** ([`ClientEnvelope`], [`ServerEnvelope`], [`RoomEvent`]):
//!   what travels on the socket.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how messages become bytes.
//!
//! ```text
//! Transport (bytes) → Protocol (envelopes) → Gateway (rooms, sessions)
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use messages::{
    Ack, AckData, ClientEnvelope, ClientMessage, ErrorCode, Loose, RoomEvent, ServerEnvelope,
    ServerPayload,
};
pub use types::{
    FinishReason, PlayerId, PlayerResult, PlayerSnapshot, RoomCode, RoomPreview, RoomSnapshot,
    RoomStatus,
};
