//! FileRecord - A single path observed while scanning a root

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A file or directory found under a scanned root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the scanned root, always `/`-separated
    pub relative_path: String,

    /// Absolute (root-joined) path on the host
    pub absolute_path: PathBuf,

    /// Size in bytes (0 for directories on most platforms)
    pub size: u64,

    /// Last modification time
    pub modified: SystemTime,

    pub is_dir: bool,
}

impl FileRecord {
    /// Create a record for a regular file
    pub fn file(
        relative_path: impl Into<String>,
        absolute_path: PathBuf,
        size: u64,
        modified: SystemTime,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            absolute_path,
            size,
            modified,
            is_dir: false,
        }
    }

    /// Create a record for a directory
    pub fn directory(
        relative_path: impl Into<String>,
        absolute_path: PathBuf,
        modified: SystemTime,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            absolute_path,
            size: 0,
            modified,
            is_dir: true,
        }
    }
}

/// Render a relative path with forward slashes regardless of the host separator.
///
/// Plans written on one platform must parse and apply on another, so every
/// path that reaches a plan goes through this.
pub fn to_portable(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a portable (`/`-separated) relative path onto a host root.
pub fn join_portable(root: &Path, portable: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in portable.split('/').filter(|s| !s.is_empty() && *s != ".") {
        path.push(segment);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_file_record() {
        let mtime = UNIX_EPOCH + Duration::from_secs(100);
        let record = FileRecord::file("a/b.txt", PathBuf::from("/root/a/b.txt"), 12, mtime);

        assert_eq!(record.relative_path, "a/b.txt");
        assert_eq!(record.size, 12);
        assert_eq!(record.modified, mtime);
        assert!(!record.is_dir);
    }

    #[test]
    fn test_directory_record() {
        let record = FileRecord::directory("a", PathBuf::from("/root/a"), UNIX_EPOCH);

        assert!(record.is_dir);
        assert_eq!(record.size, 0);
    }

    #[test]
    fn test_to_portable_uses_forward_slashes() {
        let relative: PathBuf = ["nested", "deeper", "file.txt"].iter().collect();
        assert_eq!(to_portable(&relative), "nested/deeper/file.txt");
    }

    #[test]
    fn test_join_portable() {
        let joined = join_portable(Path::new("/data"), "nested/file.txt");
        let expected: PathBuf = ["/data", "nested", "file.txt"].iter().collect();
        assert_eq!(joined, expected);
    }

    #[test]
    fn test_join_portable_ignores_empty_and_dot_segments() {
        let joined = join_portable(Path::new("/data"), "./nested//file.txt");
        let expected: PathBuf = ["/data", "nested", "file.txt"].iter().collect();
        assert_eq!(joined, expected);
    }
}
