//! Sequential directory walker

use crate::types::{to_portable, FileRecord, Snapshot, SyncError};
use std::io;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Callback for reporting scan progress
///
/// Arguments:
/// - `files_scanned`: Total number of files scanned so far
/// - `bytes_scanned`: Total bytes scanned so far
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Options that shape a scan
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Glob patterns to leave out of the scan (e.g. `*.log`, `build/`)
    pub exclude_patterns: Vec<String>,
}

/// Scan a directory and build a Snapshot
///
/// Records every file and directory below `root_path` (the root itself is not
/// recorded) with `/`-separated relative paths. Entries are visited in
/// lexicographic order and no ignore files are consulted, so two scans of an
/// unchanged tree produce identical snapshots.
///
/// # Errors
/// Any traversal or metadata failure aborts the scan with `SyncError::Scan`;
/// a partially scanned tree would produce a plan that silently misses paths.
/// A name that is not valid UTF-8 is a `SyncError::Scan` too.
/// Invalid exclude patterns return `SyncError::Config`.
pub fn scan_directory(
    root_path: &Path,
    options: &ScanOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<Snapshot, SyncError> {
    let start_time = Instant::now();
    let mut snapshot = Snapshot::new(root_path.to_path_buf());

    let mut scanned_count: u64 = 0;
    let mut scanned_bytes: u64 = 0;

    let mut override_builder = ignore::overrides::OverrideBuilder::new(root_path);
    for pattern in &options.exclude_patterns {
        // OverrideBuilder treats a leading ! as "ignore this"
        override_builder.add(&format!("!{}", pattern)).map_err(|e| {
            SyncError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
        })?;
    }
    let overrides = override_builder
        .build()
        .map_err(|e| SyncError::Config(format!("Failed to build exclude overrides: {}", e)))?;

    let walker = ignore::WalkBuilder::new(root_path)
        .standard_filters(false)
        .follow_links(false)
        .overrides(overrides)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for result in walker {
        let entry = result.map_err(|e| scan_error(root_path, e))?;

        // Depth 0 is the root itself
        if entry.depth() == 0 {
            continue;
        }

        let metadata = entry.metadata().map_err(|e| scan_error(root_path, e))?;

        let relative_path = entry.path().strip_prefix(root_path).map_err(|_| SyncError::Scan {
            root: root_path.to_path_buf(),
            source: io::Error::other(format!(
                "{} is not below the scan root",
                entry.path().display()
            )),
        })?;
        // Plans are UTF-8 text; a lossy name would never resolve at apply time
        if relative_path.to_str().is_none() {
            return Err(SyncError::Scan {
                root: root_path.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("file name is not valid UTF-8: {}", entry.path().display()),
                ),
            });
        }
        let relative = to_portable(relative_path);

        let modified = metadata.modified().map_err(|source| SyncError::Scan {
            root: root_path.to_path_buf(),
            source,
        })?;

        if metadata.is_dir() {
            snapshot.insert(FileRecord::directory(
                relative,
                entry.path().to_path_buf(),
                modified,
            ));
            continue;
        }

        snapshot.insert(FileRecord::file(
            relative,
            entry.path().to_path_buf(),
            metadata.len(),
            modified,
        ));

        scanned_count += 1;
        scanned_bytes += metadata.len();

        if let Some(callback) = on_progress {
            callback(scanned_count, scanned_bytes);
        }
    }

    snapshot.set_scan_duration(start_time.elapsed());
    debug!(
        root = %root_path.display(),
        files = snapshot.total_files,
        dirs = snapshot.total_dirs,
        bytes = snapshot.total_size,
        elapsed_ms = snapshot.scan_duration.as_millis() as u64,
        "scan complete"
    );

    Ok(snapshot)
}

fn scan_error(root_path: &Path, error: ignore::Error) -> SyncError {
    let message = error.to_string();
    let source = error
        .into_io_error()
        .unwrap_or_else(|| io::Error::other(message));
    SyncError::Scan {
        root: root_path.to_path_buf(),
        source,
    }
}
