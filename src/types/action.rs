//! Change - What the classifier decided about one path

use super::SyncError;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// Classification of a path that differs between the two roots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    /// Only in source; flows source → destination
    Create,

    /// In both, source strictly newer; flows source → destination
    Update,

    /// Only in destination
    Delete,

    /// Both sides differ and neither is a plain one-sided update
    Conflict,
}

impl ChangeAction {
    /// Plan alias token for this action
    pub fn alias(self) -> &'static str {
        match self {
            ChangeAction::Create | ChangeAction::Update => "<<",
            ChangeAction::Delete => ">>",
            ChangeAction::Conflict => "<>",
        }
    }

    /// Annotation written in the plan's flags column.
    ///
    /// External tooling greps for these exact strings.
    pub fn flag(self) -> &'static str {
        match self {
            ChangeAction::Create => "[new-in-source]",
            ChangeAction::Update => "[update: newer-in-source]",
            ChangeAction::Delete => "[new-in-dest]",
            ChangeAction::Conflict => "[CONFLICT: both-modified]",
        }
    }

    /// User-facing change-type tag used for filtering and summaries
    pub fn tag(self) -> ChangeTag {
        match self {
            ChangeAction::Create => ChangeTag::NewInSource,
            ChangeAction::Update => ChangeTag::Updates,
            ChangeAction::Delete => ChangeTag::NewInDest,
            ChangeAction::Conflict => ChangeTag::Conflicts,
        }
    }
}

/// One pending change for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub action: ChangeAction,
    pub path: String,
    pub size: u64,
    pub modified: SystemTime,
    pub is_dir: bool,
}

impl Change {
    pub fn tag(&self) -> ChangeTag {
        self.action.tag()
    }
}

/// Change-type filter vocabulary.
///
/// `Deletions` and `Unchanged` are accepted for filtering but the classifier
/// never produces changes carrying them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeTag {
    NewInSource,
    NewInDest,
    Updates,
    Conflicts,
    Deletions,
    Unchanged,
    All,
}

impl ChangeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeTag::NewInSource => "new-in-source",
            ChangeTag::NewInDest => "new-in-dest",
            ChangeTag::Updates => "updates",
            ChangeTag::Conflicts => "conflicts",
            ChangeTag::Deletions => "deletions",
            ChangeTag::Unchanged => "unchanged",
            ChangeTag::All => "all",
        }
    }

    /// Whether a filter entry of this tag selects a change tagged `other`
    pub fn selects(self, other: ChangeTag) -> bool {
        self == ChangeTag::All || self == other
    }
}

impl fmt::Display for ChangeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeTag {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "new-in-source" => Ok(ChangeTag::NewInSource),
            "new-in-dest" => Ok(ChangeTag::NewInDest),
            "updates" => Ok(ChangeTag::Updates),
            "conflicts" => Ok(ChangeTag::Conflicts),
            "deletions" => Ok(ChangeTag::Deletions),
            "unchanged" => Ok(ChangeTag::Unchanged),
            "all" => Ok(ChangeTag::All),
            other => Err(SyncError::Config(format!(
                "unknown change type '{}' (expected one of: new-in-source, new-in-dest, \
                 updates, conflicts, deletions, unchanged, all)",
                other
            ))),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ChangeTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_mapping() {
        assert_eq!(ChangeAction::Create.alias(), "<<");
        assert_eq!(ChangeAction::Update.alias(), "<<");
        assert_eq!(ChangeAction::Delete.alias(), ">>");
        assert_eq!(ChangeAction::Conflict.alias(), "<>");
    }

    #[test]
    fn test_flags_are_verbatim() {
        assert_eq!(ChangeAction::Create.flag(), "[new-in-source]");
        assert_eq!(ChangeAction::Update.flag(), "[update: newer-in-source]");
        assert_eq!(ChangeAction::Delete.flag(), "[new-in-dest]");
        assert_eq!(ChangeAction::Conflict.flag(), "[CONFLICT: both-modified]");
    }

    #[test]
    fn test_tag_mapping() {
        assert_eq!(ChangeAction::Create.tag(), ChangeTag::NewInSource);
        assert_eq!(ChangeAction::Update.tag(), ChangeTag::Updates);
        assert_eq!(ChangeAction::Delete.tag(), ChangeTag::NewInDest);
        assert_eq!(ChangeAction::Conflict.tag(), ChangeTag::Conflicts);
    }

    #[test]
    fn test_tag_parse_round_trips_display() {
        for tag in [
            ChangeTag::NewInSource,
            ChangeTag::NewInDest,
            ChangeTag::Updates,
            ChangeTag::Conflicts,
            ChangeTag::Deletions,
            ChangeTag::Unchanged,
            ChangeTag::All,
        ] {
            assert_eq!(tag.to_string().parse::<ChangeTag>().expect("parse tag"), tag);
        }
    }

    #[test]
    fn test_unknown_tag_is_config_error() {
        let err = "renamed".parse::<ChangeTag>().unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert!(err.to_string().contains("renamed"));
    }

    #[test]
    fn test_all_selects_everything() {
        assert!(ChangeTag::All.selects(ChangeTag::Conflicts));
        assert!(ChangeTag::Updates.selects(ChangeTag::Updates));
        assert!(!ChangeTag::Updates.selects(ChangeTag::Conflicts));
    }
}
