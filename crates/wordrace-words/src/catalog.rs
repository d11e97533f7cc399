//! Word-list catalog: resolves a (length, difficulty) pair to its puzzle list.
//!
//! Lists are loaded from JSON files the first time they are requested and
//! cached afterwards. Failed loads are not cached, so a file that shows up
//! later is picked up on the next request.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::{Difficulty, WordLength, WordListError};

/// An ordered, shareable list of puzzle answers.
pub type WordList = Arc<[String]>;

/// File backing each (length, difficulty) pair.
///
/// Returns `None` for combinations that have no list (e.g. six-letter easy).
pub fn file_name(length: WordLength, difficulty: Difficulty) -> Option<&'static str> {
    match (length, difficulty) {
        (WordLength::Five, Difficulty::Easy) => Some("easy-mode.json"),
        (WordLength::Five, Difficulty::Imdt) => Some("imdt-mode.json"),
        (WordLength::Five, Difficulty::Hard) => Some("hard-mode.json"),
        (WordLength::Six, Difficulty::Imdt) => Some("imdt-mode-6.json"),
        (WordLength::Six, Difficulty::Hard) => Some("hard-mode-6.json"),
        (WordLength::Six, Difficulty::Easy) => None,
    }
}

#[derive(Debug)]
enum Source {
    Dir(PathBuf),
    Memory,
}

/// Resolves word lists, caching each one on first access.
#[derive(Debug)]
pub struct WordCatalog {
    source: Source,
    cache: HashMap<(WordLength, Difficulty), WordList>,
}

impl WordCatalog {
    /// A catalog that reads `<dir>/<file_name>` on first use of each list.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Dir(dir.into()),
            cache: HashMap::new(),
        }
    }

    /// A catalog with no backing files. Lists are added with [`with_list`].
    ///
    /// [`with_list`]: Self::with_list
    pub fn in_memory() -> Self {
        Self {
            source: Source::Memory,
            cache: HashMap::new(),
        }
    }

    /// Adds (or replaces) a list. Useful for tests and embedding.
    pub fn with_list(
        mut self,
        length: WordLength,
        difficulty: Difficulty,
        words: Vec<String>,
    ) -> Self {
        self.cache.insert((length, difficulty), words.into());
        self
    }

    /// Returns the list for the given configuration.
    ///
    /// # Errors
    /// - [`WordListError::Unsupported`] if the difficulty has no list for
    ///   that length.
    /// - [`WordListError::Missing`] if an in-memory catalog has no such list.
    /// - [`WordListError::Io`] / [`WordListError::Parse`] if the backing
    ///   file can't be read.
    pub fn word_list(
        &mut self,
        length: WordLength,
        difficulty: Difficulty,
    ) -> Result<WordList, WordListError> {
        if let Some(list) = self.cache.get(&(length, difficulty)) {
            return Ok(Arc::clone(list));
        }

        let file = file_name(length, difficulty)
            .ok_or(WordListError::Unsupported { length, difficulty })?;

        let dir = match &self.source {
            Source::Dir(dir) => dir,
            Source::Memory => {
                return Err(WordListError::Missing { length, difficulty });
            }
        };

        let list = load_file(&dir.join(file))?;
        tracing::debug!(
            %length,
            %difficulty,
            words = list.len(),
            "word list loaded"
        );
        self.cache.insert((length, difficulty), Arc::clone(&list));
        Ok(list)
    }

    /// Number of lists currently held in memory.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// One list entry on disk: a bare answer, or a dictionary record whose
/// `key` is the answer. Other record fields belong to clients.
#[derive(Deserialize)]
#[serde(untagged)]
enum Entry {
    Plain(String),
    Keyed { key: String },
}

impl From<Entry> for String {
    fn from(entry: Entry) -> Self {
        match entry {
            Entry::Plain(word) | Entry::Keyed { key: word } => word,
        }
    }
}

fn load_file(path: &Path) -> Result<WordList, WordListError> {
    let raw = std::fs::read(path).map_err(|source| WordListError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<Entry> =
        serde_json::from_slice(&raw).map_err(|source| WordListError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(entries.into_iter().map(String::from).collect())
}
