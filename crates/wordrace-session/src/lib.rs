//! Player session management for Wordrace.
//!
//! A session is the server's record of one live connection: its player id,
//! the room it is bound to (at most one), and the channel its outbound
//! frames are queued on.
//!
//! # How it fits in the stack
//!
//! ```text
//! Gateway (above)  ← looks up bindings, fans events out to room members
//!     ↕
//! Session Layer (this crate)  ← player id → outbound channel + room binding
//!     ↕
//! Protocol Layer (below)  ← PlayerId, RoomCode, ServerEnvelope
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Outbound, Session};
