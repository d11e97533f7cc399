//! Error types for the room layer.

use wordrace_protocol::{ErrorCode, PlayerId, RoomCode};
use wordrace_words::{Difficulty, WordLength, WordListError};

/// A rejected room operation.
///
/// Every variant leaves the room exactly as it was. [`RoomError::code`]
/// gives the name reported to the client.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room is at capacity.
    #[error("room {0} is full")]
    Full(RoomCode),

    /// The room has left the lobby; joins are closed until it resets.
    #[error("room {0} has already started")]
    AlreadyStarted(RoomCode),

    /// The request named no usable room, or the caller isn't in one.
    #[error("no room")]
    NoRoom,

    /// The caller isn't in the room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomCode),

    /// Only the host may do this.
    #[error("player {0} is not the host")]
    NotHost(PlayerId),

    /// Fewer than the minimum players, or someone isn't ready.
    #[error("not every player is ready")]
    PlayersNotReady,

    /// The word list for the current settings is missing or empty.
    #[error("no word list for {length} letters / {difficulty}")]
    WordListUnavailable {
        length: WordLength,
        difficulty: Difficulty,
        #[source]
        source: Option<WordListError>,
    },

    /// The operation is only allowed outside of a running game.
    #[error("a game is in progress")]
    GameInProgress,
}

impl RoomError {
    /// The wire error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) | Self::NoRoom | Self::NotInRoom(..) => ErrorCode::RoomNotFound,
            Self::Full(_) => ErrorCode::RoomFull,
            Self::AlreadyStarted(_) => ErrorCode::GameStarted,
            Self::NotHost(_) => ErrorCode::NotHost,
            Self::PlayersNotReady => ErrorCode::PlayersNotReady,
            Self::WordListUnavailable { .. } => ErrorCode::WordListUnavailable,
            Self::GameInProgress => ErrorCode::GameInProgress,
        }
    }
}
