//! ConflictStrategy - How a bidirectional conflict picks its winner

use super::SyncError;
use std::fmt;
use std::str::FromStr;

/// Rule for choosing which copy wins when both sides changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStrategy {
    /// Later modification time wins; ties go to the larger file, then to the destination
    #[default]
    NewestWins,

    /// Larger file wins; ties fall through to newest-wins
    LargestWins,

    SourceWins,

    DestWins,

    /// Copy the losing side to `<path>.conflict-<unix>` then resolve as newest-wins
    Backup,
}

/// Hints recognized inside a plan operation's flags, in lookup order
const FLAG_HINTS: [(&str, ConflictStrategy); 5] = [
    ("auto:newest", ConflictStrategy::NewestWins),
    ("auto:largest", ConflictStrategy::LargestWins),
    ("auto:source", ConflictStrategy::SourceWins),
    ("auto:dest", ConflictStrategy::DestWins),
    ("auto:backup", ConflictStrategy::Backup),
];

impl ConflictStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictStrategy::NewestWins => "newest-wins",
            ConflictStrategy::LargestWins => "largest-wins",
            ConflictStrategy::SourceWins => "source-wins",
            ConflictStrategy::DestWins => "dest-wins",
            ConflictStrategy::Backup => "backup",
        }
    }

    /// Extract a strategy hint (`auto:newest`, `auto:backup`, ...) from free-text flags
    pub fn from_flags(flags: &str) -> Option<Self> {
        FLAG_HINTS
            .iter()
            .find(|(hint, _)| flags.contains(hint))
            .map(|(_, strategy)| *strategy)
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictStrategy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "newest-wins" | "newest" => Ok(ConflictStrategy::NewestWins),
            "largest-wins" | "largest" => Ok(ConflictStrategy::LargestWins),
            "source-wins" | "source" => Ok(ConflictStrategy::SourceWins),
            "dest-wins" | "dest" => Ok(ConflictStrategy::DestWins),
            "backup" => Ok(ConflictStrategy::Backup),
            other => Err(SyncError::Config(format!(
                "unknown conflict strategy '{}' (expected newest-wins, largest-wins, \
                 source-wins, dest-wins or backup)",
                other
            ))),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ConflictStrategy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
