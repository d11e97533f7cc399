//! Word-list provider for Wordrace.
//!
//! Two concerns live here:
//!
//! - **Settings** ([`WordLength`], [`Difficulty`], [`GameMode`],
//!   [`TimeLimit`]) and the `resolve_*` functions that coerce untrusted
//!   client input into valid values.
//! - **Word lists** ([`WordCatalog`]): maps a (length, difficulty) pair to
//!   the ordered list of puzzle answers.
//!
//! Nothing in this crate knows about rooms or connections.

mod catalog;
mod error;
mod settings;

pub use catalog::{file_name, WordCatalog, WordList};
pub use error::WordListError;
pub use settings::{
    resolve_difficulty, resolve_game_mode, resolve_time_limit, resolve_word_length,
    Difficulty, GameMode, TimeLimit, WordLength,
};
