//! Conflict resolution for bidirectional operations

use super::transfer::{NativeTransfer, Transfer};
use crate::content::files_identical;
use crate::types::{ConflictStrategy, SyncError};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// One of the two sync roots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Dest,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Source => Side::Dest,
            Side::Dest => Side::Source,
        }
    }
}

/// What the executor should do about a path present on both sides
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Same bytes on both sides; nothing to copy
    Identical,
    /// Copy `winner` over the other side
    Copy {
        winner: Side,
        strategy: ConflictStrategy,
        /// Where the losing copy was preserved, for the backup strategy
        backup: Option<PathBuf>,
    },
}

/// Size and mtime of one side, as far as the resolver cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub modified: SystemTime,
    pub size: u64,
}

impl FileStat {
    /// Read size and mtime from disk
    ///
    /// # Errors
    /// `SyncError::Resolve` if the metadata cannot be read.
    pub fn read(path: &Path) -> Result<Self, SyncError> {
        let resolve_error = |source| SyncError::Resolve {
            path: path.to_path_buf(),
            source,
        };
        let metadata = fs::metadata(path).map_err(resolve_error)?;
        Ok(Self {
            modified: metadata.modified().map_err(resolve_error)?,
            size: metadata.len(),
        })
    }
}

/// Pick the side whose copy survives
///
/// Deterministic for every input: newest-wins falls back to size and then to
/// the destination; largest-wins falls back to newest-wins.
pub fn pick_winner(strategy: ConflictStrategy, source: FileStat, dest: FileStat) -> Side {
    match strategy {
        ConflictStrategy::SourceWins => Side::Source,
        ConflictStrategy::DestWins => Side::Dest,
        ConflictStrategy::LargestWins => match source.size.cmp(&dest.size) {
            Ordering::Greater => Side::Source,
            Ordering::Less => Side::Dest,
            Ordering::Equal => newest(source, dest),
        },
        ConflictStrategy::NewestWins | ConflictStrategy::Backup => newest(source, dest),
    }
}

fn newest(source: FileStat, dest: FileStat) -> Side {
    match source
        .modified
        .cmp(&dest.modified)
        .then(source.size.cmp(&dest.size))
    {
        Ordering::Greater => Side::Source,
        Ordering::Less | Ordering::Equal => Side::Dest,
    }
}

/// Chooses winners for conflicting paths
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver {
    default_strategy: ConflictStrategy,
}

impl ConflictResolver {
    pub fn new(default_strategy: ConflictStrategy) -> Self {
        Self { default_strategy }
    }

    pub fn default_strategy(&self) -> ConflictStrategy {
        self.default_strategy
    }

    /// Strategy for one operation: a flag hint if present, else the default
    pub fn strategy_for(&self, flags: &str) -> ConflictStrategy {
        ConflictStrategy::from_flags(flags).unwrap_or(self.default_strategy)
    }

    /// Decide between two existing copies of the same path
    ///
    /// With the backup strategy the losing copy is first preserved as
    /// `<name>.conflict-<unix seconds>` beside itself.
    ///
    /// # Errors
    /// `SyncError::Resolve` when either side cannot be read, and any error
    /// from writing the backup copy. No winner is picked in either case.
    pub fn resolve(&self, source: &Path, dest: &Path, flags: &str) -> Result<Resolution, SyncError> {
        let source_stat = FileStat::read(source)?;
        let dest_stat = FileStat::read(dest)?;

        if source.is_file() && dest.is_file() {
            let identical = files_identical(source, dest).map_err(|e| SyncError::Resolve {
                path: dest.to_path_buf(),
                source: e,
            })?;
            if identical {
                debug!(path = %dest.display(), "conflict sides are identical");
                return Ok(Resolution::Identical);
            }
        }

        let strategy = self.strategy_for(flags);
        let winner = pick_winner(strategy, source_stat, dest_stat);

        let backup = if strategy == ConflictStrategy::Backup {
            let loser = match winner.other() {
                Side::Source => source,
                Side::Dest => dest,
            };
            Some(backup_copy(loser)?)
        } else {
            None
        };

        Ok(Resolution::Copy {
            winner,
            strategy,
            backup,
        })
    }
}

fn backup_copy(path: &Path) -> Result<PathBuf, SyncError> {
    let backup = backup_path(path);
    NativeTransfer.transfer(path, &backup)?;
    info!(original = %path.display(), backup = %backup.display(), "backed up conflicting copy");
    Ok(backup)
}

/// `<name>.conflict-<unix secs>`, with `-2`, `-3`, ... appended while taken
fn backup_path(path: &Path) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let base = path.file_name().unwrap_or_default().to_os_string();

    let mut attempt = 1u32;
    loop {
        let mut name = base.clone();
        name.push(format!(".conflict-{}", stamp));
        if attempt > 1 {
            name.push(format!("-{}", attempt));
        }
        let candidate = path.with_file_name(name);
        if fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
        attempt += 1;
    }
}
