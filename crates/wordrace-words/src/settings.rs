//! Room setting values and the resolvers that coerce client input into them.
//!
//! Client-supplied configuration is never rejected. Every resolver is a
//! total function: an unknown or missing value falls back to the caller's
//! current value when that is valid, and to a fixed default otherwise.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WordLength
// ---------------------------------------------------------------------------

/// Number of letters in each puzzle answer. Selects the word-list family.
///
/// Serialized as the plain number (`5` or `6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WordLength {
    Five,
    Six,
}

impl WordLength {
    /// Every supported length, in ascending order.
    pub const ALL: [WordLength; 2] = [WordLength::Five, WordLength::Six];

    /// The letter count as a number.
    pub fn letters(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
        }
    }

    /// Difficulties that have a word list for this length.
    ///
    /// Length 5 has an extra `easy` tier that length 6 lacks.
    pub fn difficulties(self) -> &'static [Difficulty] {
        match self {
            Self::Five => &[Difficulty::Easy, Difficulty::Imdt, Difficulty::Hard],
            Self::Six => &[Difficulty::Imdt, Difficulty::Hard],
        }
    }

    /// The difficulty used when nothing valid was requested.
    pub fn default_difficulty(self) -> Difficulty {
        match self {
            Self::Five => Difficulty::Easy,
            Self::Six => Difficulty::Imdt,
        }
    }

    /// Returns `true` if `difficulty` is allowed for this length.
    pub fn supports(self, difficulty: Difficulty) -> bool {
        self.difficulties().contains(&difficulty)
    }
}

impl Default for WordLength {
    fn default() -> Self {
        Self::Five
    }
}

impl TryFrom<u8> for WordLength {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            other => Err(format!("unsupported word length {other}")),
        }
    }
}

impl From<WordLength> for u8 {
    fn from(value: WordLength) -> Self {
        value.letters()
    }
}

impl fmt::Display for WordLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letters())
    }
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Word-list tier within a length family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Imdt,
    Hard,
}

impl Difficulty {
    /// Parses the wire name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "easy" => Some(Self::Easy),
            "imdt" => Some(Self::Imdt),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Imdt => "imdt",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// Scoring variant for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// First correct guess ends the game for everyone.
    #[default]
    Race,
    /// Players work through a shared shuffled sequence until the clock runs out.
    Timed,
}

impl GameMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "race" => Some(Self::Race),
            "timed" => Some(Self::Timed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Race => "race",
            Self::Timed => "timed",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TimeLimit
// ---------------------------------------------------------------------------

/// Length of a timed game, in whole minutes. Always one of [`TimeLimit::ALLOWED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TimeLimit(u8);

impl TimeLimit {
    /// Allowed limits in minutes.
    pub const ALLOWED: [u8; 3] = [3, 5, 10];

    /// Returns the limit if `minutes` is allowed.
    pub fn new(minutes: u8) -> Option<Self> {
        Self::ALLOWED.contains(&minutes).then_some(Self(minutes))
    }

    pub fn minutes(self) -> u8 {
        self.0
    }

    pub fn duration(self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.0) * 60)
    }
}

impl Default for TimeLimit {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for TimeLimit {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("unsupported time limit {value}"))
    }
}

impl From<TimeLimit> for u8 {
    fn from(value: TimeLimit) -> Self {
        value.0
    }
}

impl fmt::Display for TimeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

/// Returns the requested length if supported, else the default (5).
pub fn resolve_word_length(candidate: Option<u64>) -> WordLength {
    candidate
        .and_then(|v| u8::try_from(v).ok())
        .and_then(|v| WordLength::try_from(v).ok())
        .unwrap_or_default()
}

/// Returns `candidate` if valid for `length`, else `fallback` if valid for
/// `length`, else the per-length default.
pub fn resolve_difficulty(
    length: WordLength,
    candidate: Option<&str>,
    fallback: Option<Difficulty>,
) -> Difficulty {
    candidate
        .and_then(Difficulty::parse)
        .filter(|d| length.supports(*d))
        .or_else(|| fallback.filter(|d| length.supports(*d)))
        .unwrap_or_else(|| length.default_difficulty())
}

/// Validates against {race, timed}; same fallback chain as difficulty.
pub fn resolve_game_mode(candidate: Option<&str>, fallback: Option<GameMode>) -> GameMode {
    candidate
        .and_then(GameMode::parse)
        .or(fallback)
        .unwrap_or_default()
}

/// Validates against {3, 5, 10} minutes; same fallback chain.
pub fn resolve_time_limit(candidate: Option<u64>, fallback: Option<TimeLimit>) -> TimeLimit {
    candidate
        .and_then(|v| u8::try_from(v).ok())
        .and_then(TimeLimit::new)
        .or(fallback)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_word_length_accepts_supported() {
        assert_eq!(resolve_word_length(Some(5)), WordLength::Five);
        assert_eq!(resolve_word_length(Some(6)), WordLength::Six);
    }

    #[test]
    fn test_resolve_word_length_defaults_on_garbage() {
        assert_eq!(resolve_word_length(None), WordLength::Five);
        assert_eq!(resolve_word_length(Some(7)), WordLength::Five);
        assert_eq!(resolve_word_length(Some(u64::MAX)), WordLength::Five);
    }

    #[test]
    fn test_resolve_difficulty_prefers_candidate() {
        let d = resolve_difficulty(WordLength::Five, Some("hard"), Some(Difficulty::Imdt));
        assert_eq!(d, Difficulty::Hard);
    }

    #[test]
    fn test_resolve_difficulty_easy_only_for_five_letters() {
        assert_eq!(
            resolve_difficulty(WordLength::Five, Some("easy"), None),
            Difficulty::Easy
        );
        // Six letters has no easy tier: falls back, then to the default.
        assert_eq!(
            resolve_difficulty(WordLength::Six, Some("easy"), Some(Difficulty::Hard)),
            Difficulty::Hard
        );
        assert_eq!(
            resolve_difficulty(WordLength::Six, Some("easy"), Some(Difficulty::Easy)),
            Difficulty::Imdt
        );
    }

    #[test]
    fn test_resolve_difficulty_unknown_name_uses_fallback() {
        assert_eq!(
            resolve_difficulty(WordLength::Five, Some("nightmare"), Some(Difficulty::Imdt)),
            Difficulty::Imdt
        );
        assert_eq!(
            resolve_difficulty(WordLength::Five, None, None),
            Difficulty::Easy
        );
    }

    #[test]
    fn test_resolve_game_mode_chain() {
        assert_eq!(resolve_game_mode(Some("timed"), None), GameMode::Timed);
        assert_eq!(
            resolve_game_mode(Some("blitz"), Some(GameMode::Timed)),
            GameMode::Timed
        );
        assert_eq!(resolve_game_mode(None, None), GameMode::Race);
    }

    #[test]
    fn test_resolve_time_limit_chain() {
        assert_eq!(resolve_time_limit(Some(10), None).minutes(), 10);
        assert_eq!(
            resolve_time_limit(Some(4), TimeLimit::new(5)).minutes(),
            5
        );
        assert_eq!(resolve_time_limit(Some(300), None).minutes(), 3);
        assert_eq!(resolve_time_limit(None, None).minutes(), 3);
    }

    #[test]
    fn test_time_limit_duration_is_minutes() {
        let limit = TimeLimit::new(5).unwrap();
        assert_eq!(limit.duration(), std::time::Duration::from_secs(300));
    }

    #[test]
    fn test_setting_wire_format() {
        assert_eq!(serde_json::to_string(&WordLength::Six).unwrap(), "6");
        assert_eq!(serde_json::to_string(&Difficulty::Imdt).unwrap(), "\"imdt\"");
        assert_eq!(serde_json::to_string(&GameMode::Timed).unwrap(), "\"timed\"");
        assert_eq!(serde_json::to_string(&TimeLimit::default()).unwrap(), "3");
        assert!(serde_json::from_str::<WordLength>("7").is_err());
        assert!(serde_json::from_str::<TimeLimit>("4").is_err());
    }
}
