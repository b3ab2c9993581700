//! Plan files - The editable artifact between generation and execution
//!
//! A plan is plain text: a `#` comment header, one operation per line, and a
//! `#` summary. Rendering turns filtered changes into that text; parsing and
//! validation turn (possibly hand-edited) text back into a [`PlanDocument`].

mod parse;
mod render;

pub use parse::{parse_plan, read_plan_file, validate_plan};
pub use render::{
    format_operation_line, format_size, quote_path, render_conflict_plan, render_plan, PlanHeader,
};

/// Whether an operation names a file or a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    File,
    Dir,
}

impl ItemType {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "file" => Some(ItemType::File),
            "dir" => Some(ItemType::Dir),
            _ => None,
        }
    }

    /// Four-character column form used in operation lines
    pub fn padded(self) -> &'static str {
        match self {
            ItemType::File => "file",
            ItemType::Dir => "dir ",
        }
    }
}

/// Which way an operation moves data, decided by its alias
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `<<`, `s2d`, `sync-to-dest`
    SourceToDest,
    /// `>>`, `d2s`, `dest-to-source`
    DestToSource,
    /// `<>`, `bid`, `bidirectional`
    Bidirectional,
    Skip,
}

impl Direction {
    /// Map an alias token; `None` for anything unrecognized
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "<<" | "s2d" | "sync-to-dest" => Some(Direction::SourceToDest),
            ">>" | "d2s" | "dest-to-source" => Some(Direction::DestToSource),
            "<>" | "bid" | "bidirectional" => Some(Direction::Bidirectional),
            "skip" => Some(Direction::Skip),
            _ => None,
        }
    }
}

/// One parsed operation line
///
/// `size`, `modified` and `flags` are kept as written; only `flags` is
/// consulted during execution (for conflict strategy hints).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOperation {
    pub alias: String,
    pub item_type: ItemType,
    pub path: String,
    pub size: Option<String>,
    pub modified: Option<String>,
    pub flags: Option<String>,
    /// 1-based line in the plan text
    pub line_number: usize,
}

impl PlanOperation {
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_alias(&self.alias)
    }

    pub fn flags_str(&self) -> &str {
        self.flags.as_deref().unwrap_or("")
    }
}

/// A parsed plan: echoed header metadata plus operations in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanDocument {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub mode: Option<String>,
    pub include_changes: Vec<String>,
    pub exclude_changes: Vec<String>,
    pub operations: Vec<PlanOperation>,
}

impl PlanDocument {
    /// Number of bidirectional operations
    pub fn conflict_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| op.direction() == Some(Direction::Bidirectional))
            .count()
    }
}
