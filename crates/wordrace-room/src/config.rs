//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Limits shared by every room in a registry.
///
/// The defaults are the production values; tests override single fields
/// with struct update syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Minimum players required to start the game.
    pub min_players: usize,

    /// Maximum players allowed in the room.
    pub max_players: usize,

    /// Guesses per puzzle. Reaching this without solving ends the puzzle.
    pub max_attempts: u8,

    /// Rooms older than this are removed by the sweep, whatever their state.
    pub room_ttl: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 10,
            max_attempts: 6,
            room_ttl: Duration::from_secs(2 * 60 * 60),
        }
    }
}
