//! Change classification

use crate::content::files_identical;
use crate::types::{Change, ChangeAction, FileRecord, Snapshot, SyncError};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::trace;

/// Compare two snapshots and list every path that differs
///
/// Paths are visited in sorted order over the union of both snapshots, so
/// the result is sorted by path. At most one change is produced per path.
///
/// - Only in source (file) → `Create`
/// - Only in destination (file) → `Delete`
/// - Both directories → nothing
/// - Both files → byte comparison first; identical content is never a
///   change, whatever the mtimes say. Otherwise source strictly newer is an
///   `Update` and anything else is a `Conflict`.
/// - File on one side, directory on the other → `Conflict`
///
/// Directories that exist on only one side do not produce a change of
/// their own; the files inside them do.
///
/// # Errors
/// Returns `SyncError::Compare` if either file of a pair cannot be read.
///
/// # Example
/// ```
/// use syncplan::diff::classify;
/// use syncplan::types::{ChangeAction, FileRecord, Snapshot};
/// use std::path::PathBuf;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let mut src = Snapshot::new(PathBuf::from("src"));
/// let dest = Snapshot::new(PathBuf::from("dst"));
/// src.insert(FileRecord::file(
///     "new.txt",
///     PathBuf::from("src/new.txt"),
///     4,
///     UNIX_EPOCH + Duration::from_secs(1_000),
/// ));
///
/// let changes = classify(&src, &dest)?;
/// assert_eq!(changes.len(), 1);
/// assert_eq!(changes[0].action, ChangeAction::Create);
/// # Ok::<(), syncplan::types::SyncError>(())
/// ```
pub fn classify(source: &Snapshot, dest: &Snapshot) -> Result<Vec<Change>, SyncError> {
    let all_paths: BTreeSet<&String> = source.paths().chain(dest.paths()).collect();
    let mut changes = Vec::new();

    for path in all_paths {
        let action = match (source.get(path), dest.get(path)) {
            (Some(src), None) if !src.is_dir => Some((ChangeAction::Create, src)),
            (None, Some(dst)) if !dst.is_dir => Some((ChangeAction::Delete, dst)),
            (Some(src), Some(dst)) => compare_pair(src, dst)?.map(|action| (action, src)),
            _ => None,
        };

        if let Some((action, record)) = action {
            trace!(path = %path, ?action, "classified");
            changes.push(Change {
                action,
                path: path.clone(),
                size: record.size,
                modified: record.modified,
                is_dir: record.is_dir,
            });
        }
    }

    Ok(changes)
}

fn compare_pair(src: &FileRecord, dst: &FileRecord) -> Result<Option<ChangeAction>, SyncError> {
    match (src.is_dir, dst.is_dir) {
        (true, true) => Ok(None),
        (true, false) | (false, true) => Ok(Some(ChangeAction::Conflict)),
        (false, false) => {
            let identical = files_identical(&src.absolute_path, &dst.absolute_path).map_err(
                |source| SyncError::Compare {
                    path: src.relative_path.clone(),
                    source,
                },
            )?;
            if identical {
                return Ok(None);
            }

            // Equal mtimes with different bytes cannot be ordered, so they conflict
            match src.modified.cmp(&dst.modified) {
                Ordering::Greater => Ok(Some(ChangeAction::Update)),
                Ordering::Less | Ordering::Equal => Ok(Some(ChangeAction::Conflict)),
            }
        }
    }
}
