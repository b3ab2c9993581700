//! Terminal output: progress bars and styled summaries

mod progress;

pub use progress::ProgressReporter;

use crate::diff::FilteredChanges;
use crate::executor::ExecutionStats;
use crate::types::ChangeTag;
use console::style;

/// One-paragraph summary printed after a plan is written
pub fn format_plan_summary(filtered: &FilteredChanges, output: &std::path::Path) -> String {
    let mut lines = vec![format!(
        "{} {} ({} operations)",
        style("Plan written:").green().bold(),
        output.display(),
        filtered.retained.len()
    )];
    lines.push(format!(
        "  New in source: {}  New in dest: {}  Updates: {}  Conflicts: {}",
        filtered.count(ChangeTag::NewInSource),
        filtered.count(ChangeTag::NewInDest),
        filtered.count(ChangeTag::Updates),
        style(filtered.count(ChangeTag::Conflicts)).yellow()
    ));
    if filtered.filtered_out() > 0 {
        lines.push(format!("  Filtered out: {}", filtered.filtered_out()));
    }
    lines.join("\n")
}

/// Summary printed after a plan was applied
pub fn format_apply_summary(stats: &ExecutionStats) -> String {
    let mut summary = format!(
        "{} {} of {} operations ({} transfers, {} conflicts resolved, {} skipped, {} unchanged)",
        style("Applied").green().bold(),
        stats.completed_operations,
        stats.total_operations,
        stats.transfers,
        stats.conflicts_resolved,
        stats.skipped,
        stats.unchanged
    );
    if stats.backups_created > 0 {
        summary.push_str(&format!("\n  Backups created: {}", stats.backups_created));
    }
    summary
}
