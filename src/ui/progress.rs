//! Progress reporting

use crate::executor::{ExecutionEvent, ExecutionStats, OperationOutcome};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for plan generation and execution
///
/// Bars draw to stderr and hide themselves when stderr is not a terminal.
pub struct ProgressReporter {
    scan_bar: ProgressBar,
    apply_bar: ProgressBar,
    failures: usize,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let scan_bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            scan_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }

        let apply_bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} operations | {msg}")
        {
            apply_bar.set_style(style.progress_chars("=>-"));
        }

        Self {
            scan_bar,
            apply_bar,
            failures: 0,
        }
    }

    /// Mark start of a scanning phase.
    pub fn start_scan(&self, label: &str) {
        self.scan_bar.enable_steady_tick(Duration::from_millis(120));
        self.scan_bar.set_message(format!("Scanning {}...", label));
    }

    /// Update scanning progress counters.
    pub fn update_scan(&self, label: &str, files: u64, bytes: u64) {
        self.scan_bar.set_message(format!(
            "Scanning {}... {} files | {}",
            label,
            files,
            HumanBytes(bytes)
        ));
    }

    /// Mark completion of all scanning.
    pub fn finish_scan(&self, message: String) {
        self.scan_bar.finish_with_message(message);
    }

    /// Initialize apply phase progress.
    pub fn start_apply(&mut self, total_operations: u64) {
        self.failures = 0;
        self.apply_bar.set_length(total_operations);
        self.apply_bar.set_position(0);
        self.apply_bar.set_message("Starting...".to_string());
    }

    /// Feed one executor event into the apply bar.
    pub fn handle_event(&mut self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::OperationStart { alias, path, .. } => {
                self.apply_bar.set_message(format!("{} {}", alias, path));
            }
            ExecutionEvent::OperationSuccess { outcome, path, .. } => {
                self.apply_bar.inc(1);
                if let OperationOutcome::Resolved {
                    backup: Some(backup),
                    ..
                } = outcome
                {
                    self.apply_bar
                        .println(format!("Backed up {} to {}", path, backup.display()));
                }
            }
            ExecutionEvent::OperationError {
                alias,
                path,
                message,
                ..
            } => {
                self.failures += 1;
                self.apply_bar
                    .println(format!("ERROR {} {}: {}", alias, path, message));
            }
            ExecutionEvent::Complete { stats } => self.finish_apply(stats),
        }
    }

    /// Finalize apply phase.
    fn finish_apply(&self, stats: &ExecutionStats) {
        self.apply_bar.finish_with_message(format!(
            "{} transferred, {} conflicts resolved, {} skipped, {} unchanged, {} failed",
            stats.transfers,
            stats.conflicts_resolved,
            stats.skipped,
            stats.unchanged,
            self.failures
        ));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
