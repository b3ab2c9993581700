//! Snapshot - Everything one scan found under a root

use super::FileRecord;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Result of scanning one root, keyed by portable relative path
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Map: relative_path → FileRecord (sorted, so iteration is deterministic)
    pub entries: BTreeMap<String, FileRecord>,

    /// Aggregate statistics
    pub total_size: u64,
    pub total_files: usize,
    pub total_dirs: usize,

    /// Scan metadata
    pub scan_duration: Duration,
    pub root_path: PathBuf,
}

impl Snapshot {
    /// Create a new empty snapshot
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            entries: BTreeMap::new(),
            total_size: 0,
            total_files: 0,
            total_dirs: 0,
            scan_duration: Duration::from_secs(0),
            root_path,
        }
    }

    /// Insert a record, keeping aggregate statistics in step.
    ///
    /// Replacing an existing path first backs out the old record's contribution.
    pub fn insert(&mut self, record: FileRecord) {
        if let Some(old) = self.entries.get(&record.relative_path) {
            if old.is_dir {
                self.total_dirs = self.total_dirs.saturating_sub(1);
            } else {
                self.total_size = self.total_size.saturating_sub(old.size);
                self.total_files = self.total_files.saturating_sub(1);
            }
        }

        if record.is_dir {
            self.total_dirs += 1;
        } else {
            self.total_size += record.size;
            self.total_files += 1;
        }
        self.entries.insert(record.relative_path.clone(), record);
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of records (files and directories)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterator over (path, record) pairs in lexicographic path order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileRecord)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn set_scan_duration(&mut self, duration: Duration) {
        self.scan_duration = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn file(name: &str, size: u64) -> FileRecord {
        FileRecord::file(
            name,
            PathBuf::from("/root").join(name),
            size,
            UNIX_EPOCH + Duration::from_secs(1000),
        )
    }

    #[test]
    fn test_new_snapshot() {
        let root = PathBuf::from("/test/root");
        let snapshot = Snapshot::new(root.clone());

        assert_eq!(snapshot.root_path, root);
        assert_eq!(snapshot.total_size, 0);
        assert_eq!(snapshot.total_files, 0);
        assert_eq!(snapshot.total_dirs, 0);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_insert_files_and_dirs() {
        let mut snapshot = Snapshot::new(PathBuf::from("/root"));
        snapshot.insert(FileRecord::directory("dir", PathBuf::from("/root/dir"), UNIX_EPOCH));
        snapshot.insert(file("dir/a.txt", 100));
        snapshot.insert(file("b.txt", 200));

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.total_files, 2);
        assert_eq!(snapshot.total_dirs, 1);
        assert_eq!(snapshot.total_size, 300);
        assert!(snapshot.contains("dir/a.txt"));
    }

    #[test]
    fn test_duplicate_insertion_adjusts_stats() {
        let mut snapshot = Snapshot::new(PathBuf::from("/root"));
        snapshot.insert(file("file.txt", 1000));
        snapshot.insert(file("file.txt", 2000));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.total_files, 1);
        assert_eq!(snapshot.total_size, 2000);
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut snapshot = Snapshot::new(PathBuf::from("/root"));
        for name in ["z.txt", "a.txt", "m/n.txt"] {
            snapshot.insert(file(name, 1));
        }

        let paths: Vec<_> = snapshot.paths().cloned().collect();
        assert_eq!(paths, vec!["a.txt", "m/n.txt", "z.txt"]);
    }

    #[test]
    fn test_get_missing() {
        let snapshot = Snapshot::new(PathBuf::from("/root"));
        assert_eq!(snapshot.get("missing.txt"), None);
    }
}
