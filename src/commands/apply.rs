//! Plan execution command

use super::plan::write_plan;
use crate::config::{ExecuteRequest, TransferMode};
use crate::executor::{
    ConflictResolver, ExecuteOptions, ExecutionCallback, ExecutionEvent, ExecutionStats,
    NativeTransfer, PlanExecutor, RsyncTransfer, Transfer,
};
use crate::plan::{read_plan_file, render_conflict_plan};
use crate::types::SyncError;
use crate::ui::{format_apply_summary, ProgressReporter};
use chrono::Local;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Read, validate and execute a plan file
///
/// When the request names a conflict plan, the plan's bidirectional
/// operations are written there before anything is executed.
///
/// # Errors
/// Request, parse and validation errors before any change is made;
/// `SyncError::Execution` for the first operation that fails.
pub fn apply_plan(
    request: &ExecuteRequest,
    on_event: Option<&ExecutionCallback>,
) -> Result<ExecutionStats, SyncError> {
    request.validate()?;

    let document = read_plan_file(&request.plan)?;
    let roots = request.roots(&document)?;

    if let Some(conflict_plan) = &request.conflict_plan {
        write_plan(conflict_plan, &render_conflict_plan(&document, Local::now()))?;
        info!(
            path = %conflict_plan.display(),
            conflicts = document.conflict_count(),
            "wrote conflict plan"
        );
    }

    let transfer: Box<dyn Transfer> = match request.transfer {
        TransferMode::Native => Box::new(NativeTransfer),
        TransferMode::Rsync => Box::new(RsyncTransfer::locate()?),
    };
    let executor = PlanExecutor::new(
        transfer,
        ConflictResolver::new(request.conflict_strategy),
        ExecuteOptions {
            skip_conflicts: request.skip_conflicts,
        },
    );

    executor.execute(&document, &roots, on_event)
}

/// Run the `apply` command with terminal progress
pub fn run(request: &ExecuteRequest) -> Result<(), SyncError> {
    let reporter = Arc::new(Mutex::new(ProgressReporter::new()));
    let callback = {
        let reporter = Arc::clone(&reporter);
        move |event: &ExecutionEvent| {
            if let Ok(mut progress) = reporter.lock() {
                if let ExecutionEvent::OperationStart { index: 1, total, .. } = event {
                    progress.start_apply(*total as u64);
                }
                progress.handle_event(event);
            }
        }
    };

    let stats = apply_plan(request, Some(&callback))?;
    println!("{}", format_apply_summary(&stats));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Setup {
        dir: TempDir,
        src: PathBuf,
        dst: PathBuf,
    }

    fn setup() -> Setup {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        Setup { dir, src, dst }
    }

    fn write_plan_text(s: &Setup, body: &str) -> PathBuf {
        let path = s.dir.path().join("sync.plan");
        let text = format!(
            "# Source: {}\n# Destination: {}\n# Mode: one-way\n\n{}",
            s.src.display(),
            s.dst.display(),
            body
        );
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_apply_uses_plan_roots() {
        let s = setup();
        fs::write(s.src.join("a.txt"), "A").unwrap();
        let plan = write_plan_text(&s, "<< file a.txt 1 B 2024-01-01T00:00:00 [new-in-source]\n");

        let stats = apply_plan(&ExecuteRequest::new(plan), None).unwrap();
        assert_eq!(stats.transfers, 1);
        assert_eq!(fs::read_to_string(s.dst.join("a.txt")).unwrap(), "A");
    }

    #[test]
    fn test_conflict_plan_written_before_execution() {
        let s = setup();
        fs::write(s.src.join("a.txt"), "A").unwrap();
        fs::write(s.src.join("c.txt"), "one").unwrap();
        fs::write(s.dst.join("c.txt"), "two").unwrap();
        let plan = write_plan_text(
            &s,
            "<< file a.txt\n<> file c.txt 3 B 2024-01-01T00:00:00 [CONFLICT: both-modified] auto:source\n",
        );

        let mut request = ExecuteRequest::new(plan);
        request.skip_conflicts = true;
        let conflict_plan = s.dir.path().join("conflicts.plan");
        request.conflict_plan = Some(conflict_plan.clone());

        let stats = apply_plan(&request, None).unwrap();
        assert_eq!(stats.skipped, 1);

        let text = fs::read_to_string(conflict_plan).unwrap();
        assert!(text.contains("<> file c.txt"));
        assert!(text.contains("auto:source"));
        assert!(!text.contains("a.txt"));
        assert!(text.contains("# Conflicts: 1"));
        assert_eq!(fs::read_to_string(s.dst.join("c.txt")).unwrap(), "two");
    }

    #[test]
    fn test_invalid_plan_changes_nothing() {
        let s = setup();
        fs::write(s.src.join("a.txt"), "A").unwrap();
        let plan = write_plan_text(&s, "<< file a.txt\n?? file b.txt\n");

        let err = apply_plan(&ExecuteRequest::new(plan), None).unwrap_err();
        assert!(matches!(err, SyncError::UnknownAlias { .. }));
        assert!(!s.dst.join("a.txt").exists());
    }
}
