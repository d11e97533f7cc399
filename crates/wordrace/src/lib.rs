//! # Wordrace
//!
//! Real-time multiplayer word-guessing game server.
//!
//! Players create or join rooms by 6-digit code, ready up, and race to
//! solve the same puzzle (race mode) or to solve as many as they can before
//! the clock runs out (timed mode). The server is authoritative for the room
//! lifecycle and the ranking; clients resolve puzzle indices to words from
//! their own copy of the word lists.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wordrace::prelude::*;
//!
//! # async fn start() -> Result<(), WordraceError> {
//! let server = WordraceServer::builder()
//!     .config(ServerConfig::from_env()?)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod gateway;
mod handler;
mod http;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::WordraceError;
pub use gateway::{Command, CommandSender, Gateway, GatewayStats};
pub use server::{WordraceServer, WordraceServerBuilder};

/// The types most servers and tests need.
pub mod prelude {
    pub use crate::{ServerConfig, WordraceError, WordraceServer, WordraceServerBuilder};
    pub use wordrace_clock::{Clock, ManualClock, TokioClock};
    pub use wordrace_protocol::{
        Ack, AckData, ClientEnvelope, ClientMessage, ErrorCode, PlayerId, RoomCode, RoomEvent,
        RoomSnapshot, RoomStatus, ServerEnvelope, ServerPayload,
    };
    pub use wordrace_room::RoomConfig;
    pub use wordrace_words::{Difficulty, GameMode, WordCatalog, WordLength};
}
