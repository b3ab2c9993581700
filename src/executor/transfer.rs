//! Transfer primitives - "copy path A to path B, recursively if a directory"

use crate::scanner::{scan_directory, ScanOptions};
use crate::types::{join_portable, SyncError};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

/// Copies one path over another
///
/// Implementations must create any missing destination directories and
/// either finish the copy or return an error.
pub trait Transfer {
    fn transfer(&self, from: &Path, to: &Path) -> Result<(), SyncError>;

    /// Short name for log output
    fn name(&self) -> &'static str;
}

/// In-process copy using write-then-rename for each file
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTransfer;

impl Transfer for NativeTransfer {
    fn transfer(&self, from: &Path, to: &Path) -> Result<(), SyncError> {
        let wrap = |e: io::Error| SyncError::Transfer {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            message: e.to_string(),
        };

        let metadata = fs::metadata(from).map_err(wrap)?;
        if metadata.is_dir() {
            copy_dir_recursive(from, to).map_err(|e| match e {
                SyncError::Io(io_err) => wrap(io_err),
                other => SyncError::Transfer {
                    from: from.to_path_buf(),
                    to: to.to_path_buf(),
                    message: other.to_string(),
                },
            })
        } else {
            replace_mismatched(to, false).map_err(wrap)?;
            let bytes = copy_file_atomic(from, to).map_err(wrap)?;
            trace!(from = %from.display(), to = %to.display(), bytes, "copied file");
            Ok(())
        }
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<(), SyncError> {
    replace_mismatched(to, true)?;
    fs::create_dir_all(to)?;

    let snapshot = scan_directory(from, &ScanOptions::default(), None)?;
    for (relative, record) in snapshot.iter() {
        let target = join_portable(to, relative);
        if record.is_dir {
            replace_mismatched(&target, true)?;
            fs::create_dir_all(&target)?;
        } else {
            replace_mismatched(&target, false)?;
            copy_file_atomic(&record.absolute_path, &target)?;
        }
    }

    debug!(
        from = %from.display(),
        to = %to.display(),
        files = snapshot.total_files,
        "copied directory"
    );
    Ok(())
}

/// Remove whatever sits at `path` if it is not of the wanted kind
fn replace_mismatched(path: &Path, want_dir: bool) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_dir() != want_dir => remove_path_any(path),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Remove any filesystem entry at `path`.
///
/// Directories are removed recursively; files and symlinks are removed as files.
fn remove_path_any(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.file_type().is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Sibling temp path that cannot collide with another file's temp path
fn part_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.part", name))
}

/// Copy a file atomically using the write-then-rename strategy
///
/// 1. Write to a hidden `.<name>.part` file beside the destination
/// 2. Flush and sync to disk
/// 3. Preserve permissions and mtime
/// 4. Rename over the destination
///
/// The `.part` file is removed if any step fails.
///
/// # Returns
/// Number of bytes copied
pub fn copy_file_atomic(src: &Path, dest: &Path) -> io::Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let part = part_path(dest);
    let result = write_part(src, &part).and_then(|bytes| {
        fs::rename(&part, dest)?;
        Ok(bytes)
    });

    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

fn write_part(src: &Path, part: &Path) -> io::Result<u64> {
    let mut src_file = File::open(src)?;
    let mut part_file = File::create(part)?;

    let mut buffer = vec![0u8; 128 * 1024];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = src_file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        part_file.write_all(&buffer[..bytes_read])?;
        total_bytes += bytes_read as u64;
    }

    part_file.sync_all()?;
    // Drop the handle before rename (required on Windows)
    drop(part_file);

    let src_metadata = fs::metadata(src)?;
    fs::set_permissions(part, src_metadata.permissions())?;
    let mtime = filetime::FileTime::from_system_time(src_metadata.modified()?);
    filetime::set_file_mtime(part, mtime)?;

    Ok(total_bytes)
}

/// Delegates to an external `rsync --archive --checksum`
#[derive(Debug, Clone)]
pub struct RsyncTransfer {
    program: PathBuf,
}

impl Default for RsyncTransfer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("rsync"),
        }
    }
}

impl RsyncTransfer {
    /// Use a specific rsync binary instead of the one on `PATH`
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locate rsync on `PATH`
    pub fn locate() -> Result<Self, SyncError> {
        which::which("rsync")
            .map(Self::with_program)
            .map_err(|e| SyncError::Config(format!("rsync transfer selected but not found: {}", e)))
    }
}

impl Transfer for RsyncTransfer {
    fn transfer(&self, from: &Path, to: &Path) -> Result<(), SyncError> {
        let fail = |message: String| SyncError::Transfer {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            message,
        };

        let is_dir = from.is_dir();
        // A trailing slash copies the directory's contents into `to`
        let (source_arg, create) = if is_dir {
            (format!("{}/", from.display()), Some(to))
        } else {
            (from.display().to_string(), to.parent())
        };
        if let Some(dir) = create {
            fs::create_dir_all(dir).map_err(|e| fail(e.to_string()))?;
        }

        let output = Command::new(&self.program)
            .arg("--archive")
            .arg("--checksum")
            .arg(&source_arg)
            .arg(to)
            .output()
            .map_err(|e| fail(format!("failed to run {}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!(
                "rsync exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        debug!(from = %from.display(), to = %to.display(), "rsync transfer complete");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "rsync"
    }
}
