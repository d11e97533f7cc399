//! Identity types, room status, and the public room snapshot.
//!
//! Everything in this module is what clients are allowed to see. The
//! snapshot types are a deliberate serialization boundary: the room engine
//! projects its internal state into them, so nothing internal (like the
//! answer word itself) can leak just because a field was added to `Room`.

use std::fmt;

use serde::{Deserialize, Serialize};
use wordrace_words::{Difficulty, GameMode, TimeLimit, WordLength};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identity of a player. One per live connection.
///
/// Serialized as a plain number (`#[serde(transparent)]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A six-digit numeric room code, e.g. `"482913"`.
///
/// The inner string is private so a `RoomCode` is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of digits in every code.
    pub const LEN: usize = 6;

    /// Parses a code. Returns `None` unless `raw` is exactly six ASCII digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (raw.len() == Self::LEN && raw.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(raw.to_string()))
    }

    /// Formats `n` as a zero-padded six-digit code. `None` if `n >= 1_000_000`.
    pub fn from_number(n: u32) -> Option<Self> {
        (n < 1_000_000).then(|| Self(format!("{n:06}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid room code {value:?}"))
    }
}

impl From<RoomCode> for String {
    fn from(value: RoomCode) -> Self {
        value.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// Transitions form a strict cycle. No skipping states:
///
/// ```text
/// Waiting → Playing → Finished → Waiting
/// ```
///
/// - **Waiting**: lobby. Accepting joins, settings editable by the host.
/// - **Playing**: a puzzle is active. Joins rejected.
/// - **Finished**: results computed, waiting for the host to play again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    /// Returns `true` if the room accepts new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// The only state this one may move to.
    pub fn next(self) -> Self {
        match self {
            Self::Waiting => Self::Playing,
            Self::Playing => Self::Finished,
            Self::Finished => Self::Waiting,
        }
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == target
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Why a game ended without a progress update ending it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The timed-mode clock ran out.
    TimeUp,
    /// Opponents left mid-game; the last player wins by walkover.
    InsufficientPlayers,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Public view of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub ready: bool,
    /// Attempts used on the active puzzle (0–6).
    pub progress: u8,
    pub correct_count: u8,
    pub solved_count: u32,
    /// Position in the shared shuffled order (timed mode).
    pub current_word_index: usize,
    pub finished: bool,
    pub won: bool,
}

/// Public view of a room, broadcast after every change.
///
/// `word_index` is only present once the game has started, and only ever as
/// an index. Clients resolve it against their own copy of the word list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub host_id: PlayerId,
    pub difficulty: Difficulty,
    pub word_length: WordLength,
    pub max_players: usize,
    pub game_mode: GameMode,
    pub time_limit: Option<TimeLimit>,
    pub status: RoomStatus,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub players: Vec<PlayerSnapshot>,
    pub word_index: Option<usize>,
}

/// One line of the final ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub player_id: PlayerId,
    pub player_name: String,
    pub attempts: u8,
    /// Milliseconds from game start to this player's finish (or game end).
    pub time: u64,
    pub won: bool,
    pub correct_count: u8,
    pub solved_count: u32,
}

/// Non-sensitive room summary for invite-link previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPreview {
    pub code: RoomCode,
    pub difficulty: Difficulty,
    pub word_length: WordLength,
    pub game_mode: GameMode,
    pub time_limit: Option<TimeLimit>,
    pub player_count: usize,
    pub max_players: usize,
    pub status: RoomStatus,
}
