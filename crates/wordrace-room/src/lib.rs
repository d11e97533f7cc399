//! Room lifecycle for Wordrace.
//!
//! A room is a synchronous state machine owned by the gateway task. Every
//! operation takes a command value and returns a tagged outcome; the caller
//! turns outcomes into acknowledgements and broadcasts.
//!
//! # Key types
//!
//! - [`Room`]: roster, settings, progress, and ranking for one game
//! - [`RoomRegistry`]: code minting, lookup, and the expiry sweep
//! - [`RoomSettings`]: host-editable settings, always valid
//! - [`RoomConfig`]: limits shared by all rooms (players, attempts, TTL)
//! - [`ProgressOutcome`] / [`LeaveOutcome`]: what an operation did

mod command;
mod config;
mod error;
mod registry;
mod room;

pub use command::{
    GameEnd, GameStart, JoinCommand, LeaveOutcome, ProgressEcho, ProgressOutcome, ProgressUpdate,
    RoomSettings, SettingsRequest,
};
pub use config::RoomConfig;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{Player, Room};
