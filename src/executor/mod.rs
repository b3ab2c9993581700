//! Executor module - Applies a parsed plan to the two roots

mod resolver;
mod transfer;

pub use resolver::{pick_winner, ConflictResolver, FileStat, Resolution, Side};
pub use transfer::{copy_file_atomic, NativeTransfer, RsyncTransfer, Transfer};

use crate::plan::{validate_plan, Direction, PlanDocument, PlanOperation};
use crate::types::{join_portable, SyncError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The two directory roots a plan is applied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl Roots {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }

    fn path(&self, side: Side, relative: &str) -> PathBuf {
        match side {
            Side::Source => join_portable(&self.source, relative),
            Side::Dest => join_portable(&self.dest, relative),
        }
    }
}

/// Knobs for one execution run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Leave bidirectional operations untouched
    pub skip_conflicts: bool,
}

/// Execution progress statistics for a plan run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Number of operations in the plan.
    pub total_operations: usize,
    /// Operations that finished, including no-ops.
    pub completed_operations: usize,
    /// Copies performed, in either direction.
    pub transfers: usize,
    /// `skip` operations, plus bidirectional ones when conflicts are skipped.
    pub skipped: usize,
    /// Bidirectional operations whose sides turned out identical or absent.
    pub unchanged: usize,
    /// Bidirectional operations settled by the resolver.
    pub conflicts_resolved: usize,
    pub backups_created: usize,
}

/// What a single successful operation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// Data copied from the given side to the other
    Transferred { from: Side },
    /// Conflict settled by the resolver, then copied from `winner`
    Resolved {
        winner: Side,
        backup: Option<PathBuf>,
    },
    Skipped,
    /// Both sides hold the same bytes
    Identical,
    /// Neither side has the path any more
    Missing,
}

/// Events emitted while executing a plan.
#[derive(Debug)]
pub enum ExecutionEvent {
    /// Operation execution started.
    OperationStart {
        index: usize,
        total: usize,
        alias: String,
        path: String,
    },
    /// Operation execution succeeded.
    OperationSuccess {
        index: usize,
        total: usize,
        alias: String,
        path: String,
        outcome: OperationOutcome,
    },
    /// Operation failed; no further operations run.
    OperationError {
        index: usize,
        total: usize,
        alias: String,
        path: String,
        message: String,
    },
    /// Execution stopped, after the last operation or the first failure.
    Complete { stats: ExecutionStats },
}

/// Optional callback used to receive execution events.
pub type ExecutionCallback = dyn Fn(&ExecutionEvent) + Send + Sync;

/// Runs plan operations in order against a pair of roots
pub struct PlanExecutor {
    transfer: Box<dyn Transfer>,
    resolver: ConflictResolver,
    options: ExecuteOptions,
}

impl PlanExecutor {
    pub fn new(
        transfer: Box<dyn Transfer>,
        resolver: ConflictResolver,
        options: ExecuteOptions,
    ) -> Self {
        Self {
            transfer,
            resolver,
            options,
        }
    }

    /// Execute every operation of `document` in file order
    ///
    /// The whole document is validated before anything is touched. Execution
    /// stops at the first failing operation; operations before it stay
    /// applied.
    ///
    /// # Errors
    /// Validation errors as from [`validate_plan`], or `SyncError::Execution`
    /// naming the failed operation.
    pub fn execute(
        &self,
        document: &PlanDocument,
        roots: &Roots,
        on_event: Option<&ExecutionCallback>,
    ) -> Result<ExecutionStats, SyncError> {
        validate_plan(document)?;

        let total = document.operations.len();
        let mut stats = ExecutionStats {
            total_operations: total,
            ..Default::default()
        };
        info!(
            operations = total,
            transfer = self.transfer.name(),
            source = %roots.source.display(),
            dest = %roots.dest.display(),
            "executing plan"
        );

        for (idx, op) in document.operations.iter().enumerate() {
            let index = idx + 1;
            emit_event(
                on_event,
                ExecutionEvent::OperationStart {
                    index,
                    total,
                    alias: op.alias.clone(),
                    path: op.path.clone(),
                },
            );

            match self.run_operation(op, roots) {
                Ok(outcome) => {
                    record(&mut stats, &outcome);
                    emit_event(
                        on_event,
                        ExecutionEvent::OperationSuccess {
                            index,
                            total,
                            alias: op.alias.clone(),
                            path: op.path.clone(),
                            outcome,
                        },
                    );
                }
                Err(err) => {
                    emit_event(
                        on_event,
                        ExecutionEvent::OperationError {
                            index,
                            total,
                            alias: op.alias.clone(),
                            path: op.path.clone(),
                            message: err.to_string(),
                        },
                    );
                    emit_event(
                        on_event,
                        ExecutionEvent::Complete {
                            stats: stats.clone(),
                        },
                    );
                    return Err(SyncError::Execution {
                        alias: op.alias.clone(),
                        path: op.path.clone(),
                        source: Box::new(err),
                    });
                }
            }
        }

        emit_event(
            on_event,
            ExecutionEvent::Complete {
                stats: stats.clone(),
            },
        );
        Ok(stats)
    }

    fn run_operation(
        &self,
        op: &PlanOperation,
        roots: &Roots,
    ) -> Result<OperationOutcome, SyncError> {
        let direction = op.direction().ok_or_else(|| SyncError::UnknownAlias {
            line_number: op.line_number,
            alias: op.alias.clone(),
        })?;
        info!(alias = %op.alias, path = %op.path, "executing");

        match direction {
            Direction::Skip => Ok(OperationOutcome::Skipped),
            Direction::SourceToDest => self.copy(roots, Side::Source, &op.path),
            Direction::DestToSource => self.copy(roots, Side::Dest, &op.path),
            Direction::Bidirectional if self.options.skip_conflicts => {
                debug!(path = %op.path, "skipping bidirectional operation");
                Ok(OperationOutcome::Skipped)
            }
            Direction::Bidirectional => self.reconcile(op, roots),
        }
    }

    fn reconcile(&self, op: &PlanOperation, roots: &Roots) -> Result<OperationOutcome, SyncError> {
        let source = roots.path(Side::Source, &op.path);
        let dest = roots.path(Side::Dest, &op.path);

        match (exists(&source), exists(&dest)) {
            (true, false) => self.copy(roots, Side::Source, &op.path),
            (false, true) => self.copy(roots, Side::Dest, &op.path),
            (false, false) => {
                warn!(path = %op.path, "path no longer exists on either side");
                Ok(OperationOutcome::Missing)
            }
            (true, true) => match self.resolver.resolve(&source, &dest, op.flags_str())? {
                Resolution::Identical => Ok(OperationOutcome::Identical),
                Resolution::Copy {
                    winner,
                    strategy,
                    backup,
                } => {
                    info!(path = %op.path, ?winner, %strategy, "resolved conflict");
                    self.copy(roots, winner, &op.path)?;
                    Ok(OperationOutcome::Resolved { winner, backup })
                }
            },
        }
    }

    /// Copy `relative` from `from` to the other side, creating its parent first
    fn copy(&self, roots: &Roots, from: Side, relative: &str) -> Result<OperationOutcome, SyncError> {
        let src = roots.path(from, relative);
        let dst = roots.path(from.other(), relative);

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        self.transfer.transfer(&src, &dst)?;
        Ok(OperationOutcome::Transferred { from })
    }
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn record(stats: &mut ExecutionStats, outcome: &OperationOutcome) {
    stats.completed_operations += 1;
    match outcome {
        OperationOutcome::Transferred { .. } => stats.transfers += 1,
        OperationOutcome::Resolved { backup, .. } => {
            stats.transfers += 1;
            stats.conflicts_resolved += 1;
            if backup.is_some() {
                stats.backups_created += 1;
            }
        }
        OperationOutcome::Skipped => stats.skipped += 1,
        OperationOutcome::Identical | OperationOutcome::Missing => stats.unchanged += 1,
    }
}

fn emit_event(on_event: Option<&ExecutionCallback>, event: ExecutionEvent) {
    if let Some(callback) = on_event {
        callback(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::parse_plan;
    use crate::types::ConflictStrategy;
    use filetime::{set_file_mtime, FileTime};
    use std::cell::RefCell;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct Fixture {
        _src: TempDir,
        _dst: TempDir,
        roots: Roots,
    }

    fn fixture() -> Fixture {
        let src = tempfile::tempdir().expect("create src tempdir");
        let dst = tempfile::tempdir().expect("create dst tempdir");
        let roots = Roots::new(src.path(), dst.path());
        Fixture {
            _src: src,
            _dst: dst,
            roots,
        }
    }

    fn native(options: ExecuteOptions) -> PlanExecutor {
        PlanExecutor::new(
            Box::new(NativeTransfer),
            ConflictResolver::new(ConflictStrategy::NewestWins),
            options,
        )
    }

    /// Records calls instead of copying
    #[derive(Default)]
    struct RecordingTransfer {
        calls: RefCell<Vec<(PathBuf, PathBuf)>>,
        fail_on: Option<String>,
    }

    impl Transfer for RecordingTransfer {
        fn transfer(&self, from: &Path, to: &Path) -> Result<(), SyncError> {
            if let Some(name) = &self.fail_on {
                if from.ends_with(name) {
                    return Err(SyncError::Transfer {
                        from: from.to_path_buf(),
                        to: to.to_path_buf(),
                        message: "injected failure".to_string(),
                    });
                }
            }
            self.calls
                .borrow_mut()
                .push((from.to_path_buf(), to.to_path_buf()));
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[test]
    fn test_directions() {
        let f = fixture();
        fs::write(f.roots.source.join("to_dest.txt"), "s").unwrap();
        fs::write(f.roots.dest.join("to_source.txt"), "d").unwrap();

        let doc = parse_plan("<< file to_dest.txt\nd2s file to_source.txt\nskip file ignored.txt\n")
            .unwrap();
        let stats = native(ExecuteOptions::default())
            .execute(&doc, &f.roots, None)
            .unwrap();

        assert_eq!(stats.total_operations, 3);
        assert_eq!(stats.completed_operations, 3);
        assert_eq!(stats.transfers, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(
            fs::read_to_string(f.roots.dest.join("to_dest.txt")).unwrap(),
            "s"
        );
        assert_eq!(
            fs::read_to_string(f.roots.source.join("to_source.txt")).unwrap(),
            "d"
        );
        assert!(!f.roots.dest.join("ignored.txt").exists());
    }

    #[test]
    fn test_creates_parent_directories() {
        let f = fixture();
        fs::create_dir_all(f.roots.source.join("a/b")).unwrap();
        fs::write(f.roots.source.join("a/b/c.txt"), "deep").unwrap();

        let doc = parse_plan("<< file a/b/c.txt").unwrap();
        native(ExecuteOptions::default())
            .execute(&doc, &f.roots, None)
            .unwrap();
        assert_eq!(
            fs::read_to_string(f.roots.dest.join("a/b/c.txt")).unwrap(),
            "deep"
        );
    }

    #[test]
    fn test_bidirectional_one_sided_copies_from_present_side() {
        let f = fixture();
        fs::write(f.roots.dest.join("only_dest.txt"), "d").unwrap();
        fs::write(f.roots.source.join("only_src.txt"), "s").unwrap();

        let doc = parse_plan("<> file only_dest.txt\nbid file only_src.txt\n<> file gone.txt\n")
            .unwrap();
        let stats = native(ExecuteOptions::default())
            .execute(&doc, &f.roots, None)
            .unwrap();

        assert!(f.roots.source.join("only_dest.txt").exists());
        assert!(f.roots.dest.join("only_src.txt").exists());
        assert_eq!(stats.transfers, 2);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(stats.conflicts_resolved, 0);
    }

    #[test]
    fn test_bidirectional_resolves_newest() {
        let f = fixture();
        let src = f.roots.source.join("c.txt");
        let dst = f.roots.dest.join("c.txt");
        fs::write(&src, "older").unwrap();
        fs::write(&dst, "newer").unwrap();
        set_file_mtime(&src, FileTime::from_unix_time(100, 0)).unwrap();
        set_file_mtime(&dst, FileTime::from_unix_time(200, 0)).unwrap();

        let doc = parse_plan("<> file c.txt").unwrap();
        let stats = native(ExecuteOptions::default())
            .execute(&doc, &f.roots, None)
            .unwrap();

        assert_eq!(stats.conflicts_resolved, 1);
        assert_eq!(fs::read_to_string(&src).unwrap(), "newer");
        assert_eq!(fs::read_to_string(&dst).unwrap(), "newer");
    }

    #[test]
    fn test_skip_conflicts_leaves_both_sides() {
        let f = fixture();
        fs::write(f.roots.source.join("c.txt"), "one").unwrap();
        fs::write(f.roots.dest.join("c.txt"), "two").unwrap();

        let doc = parse_plan("<> file c.txt").unwrap();
        let stats = native(ExecuteOptions {
            skip_conflicts: true,
        })
        .execute(&doc, &f.roots, None)
        .unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(
            fs::read_to_string(f.roots.source.join("c.txt")).unwrap(),
            "one"
        );
        assert_eq!(
            fs::read_to_string(f.roots.dest.join("c.txt")).unwrap(),
            "two"
        );
    }

    #[test]
    fn test_unknown_alias_blocks_all_operations() {
        let f = fixture();
        fs::write(f.roots.source.join("a.txt"), "a").unwrap();

        let doc = parse_plan("<< file a.txt\n=> file b.txt\n").unwrap();
        let executor = PlanExecutor::new(
            Box::new(RecordingTransfer::default()),
            ConflictResolver::default(),
            ExecuteOptions::default(),
        );
        let err = executor.execute(&doc, &f.roots, None).unwrap_err();
        assert!(matches!(err, SyncError::UnknownAlias { line_number: 2, .. }));
        assert!(!f.roots.dest.join("a.txt").exists());
    }

    #[test]
    fn test_stops_at_first_failure() {
        let f = fixture();
        let doc = parse_plan("<< file one.txt\n<< file two.txt\n<< file three.txt\n").unwrap();

        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let events_ref = Arc::clone(&events);
        let callback = move |event: &ExecutionEvent| {
            let label = match event {
                ExecutionEvent::OperationStart { path, .. } => format!("start {}", path),
                ExecutionEvent::OperationSuccess { path, .. } => format!("success {}", path),
                ExecutionEvent::OperationError { path, .. } => format!("error {}", path),
                ExecutionEvent::Complete { stats } => {
                    format!("complete {}", stats.completed_operations)
                }
            };
            events_ref.lock().expect("lock events").push(label);
        };

        let executor = PlanExecutor::new(
            Box::new(RecordingTransfer {
                fail_on: Some("two.txt".to_string()),
                ..Default::default()
            }),
            ConflictResolver::default(),
            ExecuteOptions::default(),
        );
        let err = executor
            .execute(&doc, &f.roots, Some(&callback))
            .unwrap_err();

        match err {
            SyncError::Execution { alias, path, .. } => {
                assert_eq!(alias, "<<");
                assert_eq!(path, "two.txt");
            }
            other => panic!("expected execution error, got {:?}", other),
        }

        let snapshot = events.lock().expect("lock events snapshot").clone();
        assert_eq!(
            snapshot,
            vec![
                "start one.txt",
                "success one.txt",
                "start two.txt",
                "error two.txt",
                "complete 1",
            ]
        );
    }

    #[test]
    fn test_empty_document_is_noop() {
        let f = fixture();
        let stats = native(ExecuteOptions::default())
            .execute(&PlanDocument::default(), &f.roots, None)
            .unwrap();
        assert_eq!(stats, ExecutionStats::default());
    }
}
