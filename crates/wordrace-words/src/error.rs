//! Error types for word-list resolution.

use std::path::PathBuf;

use crate::{Difficulty, WordLength};

/// Errors that can occur while resolving a word list.
///
/// Callers treat every variant the same way (the list is unavailable);
/// the variants exist so the cause ends up in the logs.
#[derive(Debug, thiserror::Error)]
pub enum WordListError {
    /// No list exists for this pair (e.g. six-letter `easy`).
    #[error("no word list for {length}-letter {difficulty}")]
    Unsupported {
        length: WordLength,
        difficulty: Difficulty,
    },

    /// An in-memory catalog was never given this list.
    #[error("word list for {length}-letter {difficulty} is not loaded")]
    Missing {
        length: WordLength,
        difficulty: Difficulty,
    },

    /// The backing file couldn't be read.
    #[error("failed to read word list {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file isn't a JSON array of answers or `{key, value}` records.
    #[error("malformed word list {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
