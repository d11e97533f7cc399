//! Command values passed into a [`Room`](crate::Room) and the tagged results
//! it hands back.
//!
//! The gateway matches on the outcome enums exhaustively, so a new kind of
//! result can't be silently dropped on the way to the wire.

use wordrace_protocol::{FinishReason, PlayerId, PlayerResult};
use wordrace_words::{
    Difficulty, GameMode, TimeLimit, WordLength, resolve_difficulty, resolve_game_mode,
    resolve_time_limit, resolve_word_length,
};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A connection asking to enter a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCommand {
    pub player: PlayerId,
    /// Display name, already sanitized by the caller.
    pub name: String,
}

/// Settings as requested by a client, before validation.
///
/// `None` means "not sent". Values that were sent but can't be used still
/// resolve to something valid; see [`RoomSettings::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsRequest {
    pub word_length: Option<u64>,
    pub difficulty: Option<String>,
    pub game_mode: Option<String>,
    pub time_limit: Option<u64>,
}

/// One guess-progress report from a player.
///
/// Fields are raw client values; the room clamps them to sane ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub progress: u32,
    pub won: bool,
    pub correct_count: Option<u32>,
}

// ---------------------------------------------------------------------------
// RoomSettings
// ---------------------------------------------------------------------------

/// The host-editable configuration of a room. Always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSettings {
    pub word_length: WordLength,
    pub difficulty: Difficulty,
    pub game_mode: GameMode,
    /// `Some` exactly when `game_mode` is timed.
    pub time_limit: Option<TimeLimit>,
}

impl RoomSettings {
    /// Coerces a request into valid settings.
    ///
    /// Each field falls back to `current` when the request doesn't carry a
    /// usable value, then to the fixed default. A word-length change re-checks
    /// the difficulty, since the allowed tiers depend on length.
    pub fn resolve(request: &SettingsRequest, current: Option<&RoomSettings>) -> Self {
        let word_length = match (request.word_length, current) {
            (Some(requested), _) => resolve_word_length(Some(requested)),
            (None, Some(current)) => current.word_length,
            (None, None) => WordLength::default(),
        };
        let difficulty = resolve_difficulty(
            word_length,
            request.difficulty.as_deref(),
            current.map(|c| c.difficulty),
        );
        let game_mode = resolve_game_mode(request.game_mode.as_deref(), current.map(|c| c.game_mode));
        let time_limit = match game_mode {
            GameMode::Timed => Some(resolve_time_limit(
                request.time_limit,
                current.and_then(|c| c.time_limit),
            )),
            GameMode::Race => None,
        };
        Self {
            word_length,
            difficulty,
            game_mode,
            time_limit,
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self::resolve(&SettingsRequest::default(), None)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Puzzle selection made by a successful start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStart {
    /// Race: the shared puzzle. Timed: the first entry of `word_indices`.
    pub word_index: usize,
    /// Timed mode only: the shuffled order every player works through.
    pub word_indices: Option<Vec<usize>>,
}

/// A game that just moved to `finished`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEnd {
    /// Ranked best first.
    pub results: Vec<PlayerResult>,
    /// The player whose guess or walkover ended the game, if any.
    pub winner: Option<PlayerId>,
    /// Set when the game ended without a progress update ending it.
    pub reason: Option<FinishReason>,
}

/// The progress values actually recorded, after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEcho {
    pub progress: u8,
    pub won: bool,
    pub correct_count: u8,
}

/// What a progress update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// Nothing changed: room not playing, unknown player, or the player
    /// already finished.
    Ignored,
    /// Recorded; the game goes on.
    Continuing { echo: ProgressEcho },
    /// Timed mode: the player moved on to the puzzle at `word_pointer` in the
    /// shared order.
    NextWord { echo: ProgressEcho, word_pointer: usize },
    /// Recorded, and it ended the game.
    Finished { echo: ProgressEcho, end: GameEnd },
}

impl ProgressOutcome {
    /// The recorded values, unless the update was ignored.
    pub fn echo(&self) -> Option<&ProgressEcho> {
        match self {
            Self::Ignored => None,
            Self::Continuing { echo } | Self::NextWord { echo, .. } | Self::Finished { echo, .. } => {
                Some(echo)
            }
        }
    }
}

/// What a departure did to the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The player wasn't in the room.
    NotMember,
    /// The last player left. The caller deletes the room.
    Empty,
    /// Others remain.
    Remaining {
        /// Set if the host left and the role moved.
        new_host: Option<PlayerId>,
        /// Set if the departure ended a running game.
        end: Option<GameEnd>,
    },
}
