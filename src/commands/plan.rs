//! Plan generation command

use crate::config::GenerateRequest;
use crate::diff::{classify, ChangeFilter, FilteredChanges};
use crate::editor::{launch_editor, EditorSelector};
use crate::plan::{read_plan_file, render_plan, PlanHeader};
use crate::scanner::{scan_directory, ProgressCallback, ScanOptions};
use crate::types::{Snapshot, SyncError};
use crate::ui::{format_plan_summary, ProgressReporter};
use chrono::Local;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Optional per-root scan progress callbacks
#[derive(Default)]
pub struct ScanProgress {
    pub source: Option<ProgressCallback>,
    pub dest: Option<ProgressCallback>,
}

/// A rendered plan and the changes it lists
#[derive(Debug, Clone)]
pub struct GeneratedPlan {
    pub text: String,
    pub filtered: FilteredChanges,
    pub source: Snapshot,
    pub dest: Snapshot,
}

/// Scan, classify, filter and render; nothing is written to disk
///
/// # Errors
/// Request validation errors, `SyncError::Scan` and `SyncError::Compare`.
pub fn generate_plan(
    request: &GenerateRequest,
    progress: &ScanProgress,
) -> Result<GeneratedPlan, SyncError> {
    request.validate()?;

    let options = ScanOptions {
        exclude_patterns: request.exclude_patterns.clone(),
    };
    let (source, dest) = scan_roots(request, &options, progress)?;

    let changes = classify(&source, &dest)?;
    let filter = ChangeFilter::new(
        request.include_changes.clone(),
        request.exclude_changes.clone(),
    );
    let filtered = filter.apply(changes);
    info!(
        changes = filtered.total_before,
        retained = filtered.retained.len(),
        "classified changes"
    );

    let header = PlanHeader {
        generated_at: request.generated_at.unwrap_or_else(Local::now),
        invocation: request.invocation.clone(),
        source: request.source.display().to_string(),
        destination: request.dest.display().to_string(),
        mode: request.mode.to_string(),
        include_changes: request.include_changes.clone(),
        exclude_changes: request.exclude_changes.clone(),
    };
    let text = render_plan(&header, &filtered);

    Ok(GeneratedPlan {
        text,
        filtered,
        source,
        dest,
    })
}

fn scan_roots(
    request: &GenerateRequest,
    options: &ScanOptions,
    progress: &ScanProgress,
) -> Result<(Snapshot, Snapshot), SyncError> {
    let scan_dest = || {
        if request.dest.exists() {
            scan_directory(&request.dest, options, progress.dest.as_ref())
        } else {
            Ok(Snapshot::new(request.dest.clone()))
        }
    };

    if !request.parallel_scan {
        let source = scan_directory(&request.source, options, progress.source.as_ref())?;
        return Ok((source, scan_dest()?));
    }

    std::thread::scope(|scope| {
        let dest_handle = scope.spawn(scan_dest);
        let source = scan_directory(&request.source, options, progress.source.as_ref());
        let dest = dest_handle
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
        source.and_then(|source| dest.map(|dest| (source, dest)))
    })
}

/// Write the plan file, creating its parent directory if needed
pub fn write_plan(path: &Path, text: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

/// Open the written plan in an editor, then re-validate it
///
/// A plan that no longer validates after editing is reported as a warning;
/// `apply` will reject it with the precise error.
pub fn edit_plan(path: &Path, selector: &EditorSelector) -> Result<(), SyncError> {
    let editor = selector.select()?;
    info!(editor = %editor, plan = %path.display(), "opening plan in editor");
    launch_editor(&editor, path)?;

    match read_plan_file(path) {
        Ok(document) => {
            info!(operations = document.operations.len(), "edited plan is valid");
        }
        Err(err) => {
            warn!(error = %err, "edited plan does not validate");
            eprintln!("Warning: plan validation failed: {}", err);
        }
    }
    Ok(())
}

/// Run the `plan` command with terminal progress
pub fn run(request: &GenerateRequest, editor: Option<EditorSelector>) -> Result<(), SyncError> {
    let reporter = Arc::new(Mutex::new(ProgressReporter::new()));
    if let Ok(reporter) = reporter.lock() {
        reporter.start_scan("source and destination");
    }
    let progress = ScanProgress {
        source: Some(scan_callback(&reporter, "source")),
        dest: Some(scan_callback(&reporter, "destination")),
    };

    let generated = generate_plan(request, &progress)?;
    if let Ok(reporter) = reporter.lock() {
        reporter.finish_scan(format!(
            "Scanned {} source and {} destination files",
            generated.source.total_files, generated.dest.total_files
        ));
    }

    write_plan(&request.output, &generated.text)?;
    println!("{}", format_plan_summary(&generated.filtered, &request.output));

    if let Some(selector) = editor {
        edit_plan(&request.output, &selector)?;
    }
    Ok(())
}

fn scan_callback(reporter: &Arc<Mutex<ProgressReporter>>, label: &'static str) -> ProgressCallback {
    let reporter = Arc::clone(reporter);
    Box::new(move |files: u64, bytes: u64| {
        if let Ok(progress) = reporter.lock() {
            progress.update_scan(label, files, bytes);
        }
    })
}
