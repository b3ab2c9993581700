//! Command-line interface definition

use super::{SyncMode, TransferMode};
use crate::logging::LogFormat;
use crate::types::{ChangeTag, ConflictStrategy};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Two-phase directory sync: write an editable plan, apply it later
#[derive(Parser, Debug)]
#[command(name = "syncplan", version, about)]
pub struct Cli {
    /// Config file (default: sync.toml or .sync.toml in the working directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log level filter (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare two directories and write a sync plan
    Plan(PlanArgs),
    /// Apply a previously generated (and possibly edited) plan
    Apply(ApplyArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Source directory
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Destination directory (may not exist yet)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Where to write the plan
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Sync mode recorded in the plan header
    #[arg(long, value_enum)]
    pub mode: Option<SyncMode>,

    /// Only list these change types (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "TYPES")]
    pub include_changes: Vec<ChangeTag>,

    /// Drop these change types (comma separated); applied after --include-changes
    #[arg(long, value_delimiter = ',', value_name = "TYPES")]
    pub exclude_changes: Vec<ChangeTag>,

    /// Glob pattern to leave out of both scans (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Open the plan in an editor once written
    #[arg(long)]
    pub edit: bool,

    /// Editor command to use with --edit (default: $VISUAL, $EDITOR, then vim/vi/nano/emacs/code)
    #[arg(long, requires = "edit")]
    pub editor: Option<String>,

    /// Scan source and destination concurrently
    #[arg(long)]
    pub parallel_scan: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Plan file to apply
    pub plan: PathBuf,

    /// Source directory (default: the plan's `# Source:` header)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Destination directory (default: the plan's `# Destination:` header)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Strategy for conflicts without an auto: hint
    #[arg(long, value_name = "STRATEGY")]
    pub conflict_strategy: Option<ConflictStrategy>,

    /// Leave bidirectional operations untouched
    #[arg(long)]
    pub skip_conflicts: bool,

    /// Also write the plan's conflicts to this file
    #[arg(long, value_name = "FILE")]
    pub conflict_plan: Option<PathBuf>,

    /// Transfer primitive
    #[arg(long, value_enum)]
    pub transfer: Option<TransferMode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan_command() {
        let cli = Cli::try_parse_from([
            "syncplan",
            "-vv",
            "plan",
            "--source",
            "/s",
            "--dest",
            "/d",
            "-o",
            "out.plan",
            "--include-changes",
            "new-in-source,updates",
            "--exclude-changes",
            "updates",
            "--exclude",
            "*.log",
            "--mode",
            "two-way",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Command::Plan(args) = cli.command else {
            panic!("expected plan subcommand");
        };
        assert_eq!(args.source, Some(PathBuf::from("/s")));
        assert_eq!(args.output, PathBuf::from("out.plan"));
        assert_eq!(
            args.include_changes,
            vec![ChangeTag::NewInSource, ChangeTag::Updates]
        );
        assert_eq!(args.exclude_changes, vec![ChangeTag::Updates]);
        assert_eq!(args.exclude, vec!["*.log"]);
        assert_eq!(args.mode, Some(SyncMode::TwoWay));
    }

    #[test]
    fn test_parse_apply_command() {
        let cli = Cli::try_parse_from([
            "syncplan",
            "apply",
            "sync.plan",
            "--conflict-strategy",
            "source-wins",
            "--skip-conflicts",
            "--transfer",
            "rsync",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, Some(LogFormat::Json));
        let Command::Apply(args) = cli.command else {
            panic!("expected apply subcommand");
        };
        assert_eq!(args.plan, PathBuf::from("sync.plan"));
        assert_eq!(args.conflict_strategy, Some(ConflictStrategy::SourceWins));
        assert!(args.skip_conflicts);
        assert_eq!(args.transfer, Some(TransferMode::Rsync));
    }

    #[test]
    fn test_unknown_change_type_rejected() {
        let result = Cli::try_parse_from([
            "syncplan",
            "plan",
            "--source",
            "/s",
            "--dest",
            "/d",
            "-o",
            "p",
            "--include-changes",
            "renamed",
        ]);
        assert!(result.is_err());
    }
}
