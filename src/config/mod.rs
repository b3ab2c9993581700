//! Configuration management
//!
//! Values come from three places, later ones winning: built-in defaults, an
//! optional TOML file (`--config`, else `sync.toml` or `.sync.toml` in the
//! working directory), and command-line flags. The merged result is one of
//! two request objects, [`GenerateRequest`] or [`ExecuteRequest`].

mod cli;

pub use cli::{ApplyArgs, Cli, Command, PlanArgs};

use crate::logging::LogFormat;
use crate::plan::PlanDocument;
use crate::types::{ChangeTag, ConflictStrategy, SyncError};
use chrono::{DateTime, Local};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names looked up in the working directory, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["sync.toml", ".sync.toml"];

/// Sync mode echoed in the plan header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    #[default]
    OneWay,
    TwoWay,
}

impl SyncMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncMode::OneWay => "one-way",
            SyncMode::TwoWay => "two-way",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which transfer primitive applies a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Native,
    Rsync,
}

/// Contents of a `sync.toml` file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<PathBuf>,
    pub dest: Option<PathBuf>,
    pub mode: Option<SyncMode>,
    /// Glob patterns left out of both scans
    pub exclude: Vec<String>,
    pub include_changes: Vec<ChangeTag>,
    pub exclude_changes: Vec<ChangeTag>,
    pub conflict_strategy: Option<ConflictStrategy>,
    pub transfer: Option<TransferMode>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl FileConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, SyncError> {
        toml::from_str(text).map_err(|e| SyncError::Config(format!("Invalid config file: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let text = fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Load the explicit file if given, else the first default name found in `dir`
    ///
    /// No file at all yields the defaults; a named file that is missing is an error.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, SyncError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
            .map_or_else(|| Ok(Self::default()), |path| Self::load(&path))
    }
}

/// Make `path` absolute against the working directory
pub fn absolutize(path: &Path) -> Result<PathBuf, SyncError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Everything needed to produce a plan file
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub mode: SyncMode,
    pub include_changes: Vec<ChangeTag>,
    pub exclude_changes: Vec<ChangeTag>,
    pub exclude_patterns: Vec<String>,
    pub output: PathBuf,
    /// Written to the `# Generated from:` header line
    pub invocation: String,
    /// Scan both roots at once on two threads
    pub parallel_scan: bool,
    /// Header timestamp; `None` means now
    pub generated_at: Option<DateTime<Local>>,
}

impl GenerateRequest {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let dest = dest.into();
        let output = output.into();
        let invocation = format!(
            "syncplan plan --source {} --dest {} --output {}",
            source.display(),
            dest.display(),
            output.display()
        );
        Self {
            source,
            dest,
            mode: SyncMode::default(),
            include_changes: Vec::new(),
            exclude_changes: Vec::new(),
            exclude_patterns: Vec::new(),
            output,
            invocation,
            parallel_scan: false,
            generated_at: None,
        }
    }

    /// Merge command-line flags over file values
    pub fn from_cli(args: &PlanArgs, file: &FileConfig) -> Result<Self, SyncError> {
        let source = args
            .source
            .clone()
            .or_else(|| file.source.clone())
            .ok_or_else(|| SyncError::Config("No source directory given (--source)".to_string()))?;
        let dest = args
            .dest
            .clone()
            .or_else(|| file.dest.clone())
            .ok_or_else(|| {
                SyncError::Config("No destination directory given (--dest)".to_string())
            })?;

        let mut request = Self::new(absolutize(&source)?, absolutize(&dest)?, args.output.clone());
        request.mode = args.mode.or(file.mode).unwrap_or_default();
        request.include_changes = pick(&args.include_changes, &file.include_changes);
        request.exclude_changes = pick(&args.exclude_changes, &file.exclude_changes);
        request.exclude_patterns = file
            .exclude
            .iter()
            .chain(args.exclude.iter())
            .cloned()
            .collect();
        request.parallel_scan = args.parallel_scan;
        Ok(request)
    }

    /// Check the request before any scanning happens
    pub fn validate(&self) -> Result<(), SyncError> {
        if !self.source.is_dir() {
            return Err(SyncError::Config(format!(
                "Source path does not exist or is not a directory: {}",
                self.source.display()
            )));
        }
        if self.dest.exists() && !self.dest.is_dir() {
            return Err(SyncError::Config(format!(
                "Destination exists but is not a directory: {}",
                self.dest.display()
            )));
        }
        if self.source == self.dest {
            return Err(SyncError::Config(
                "Source and destination cannot be the same".to_string(),
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(SyncError::Config("No plan output path given".to_string()));
        }
        Ok(())
    }
}

fn pick(cli: &[ChangeTag], file: &[ChangeTag]) -> Vec<ChangeTag> {
    if cli.is_empty() {
        file.to_vec()
    } else {
        cli.to_vec()
    }
}

/// Everything needed to apply an existing plan
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub plan: PathBuf,
    /// Overrides the plan's `# Source:` header
    pub source: Option<PathBuf>,
    /// Overrides the plan's `# Destination:` header
    pub dest: Option<PathBuf>,
    /// Used for conflicts whose flags carry no `auto:` hint
    pub conflict_strategy: ConflictStrategy,
    pub skip_conflicts: bool,
    /// Also write the bidirectional operations to this file
    pub conflict_plan: Option<PathBuf>,
    pub transfer: TransferMode,
}

impl ExecuteRequest {
    pub fn new(plan: impl Into<PathBuf>) -> Self {
        Self {
            plan: plan.into(),
            source: None,
            dest: None,
            conflict_strategy: ConflictStrategy::default(),
            skip_conflicts: false,
            conflict_plan: None,
            transfer: TransferMode::default(),
        }
    }

    /// Merge command-line flags over file values
    ///
    /// The file's `source`/`dest` are not used here; a plan carries its own
    /// roots and only explicit flags override them.
    pub fn from_cli(args: &ApplyArgs, file: &FileConfig) -> Self {
        Self {
            plan: args.plan.clone(),
            source: args.source.clone(),
            dest: args.dest.clone(),
            conflict_strategy: args
                .conflict_strategy
                .or(file.conflict_strategy)
                .unwrap_or_default(),
            skip_conflicts: args.skip_conflicts,
            conflict_plan: args.conflict_plan.clone(),
            transfer: args.transfer.or(file.transfer).unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if !self.plan.is_file() {
            return Err(SyncError::Config(format!(
                "Plan file does not exist: {}",
                self.plan.display()
            )));
        }
        if let Some(conflict_plan) = &self.conflict_plan {
            if conflict_plan == &self.plan {
                return Err(SyncError::Config(
                    "Conflict plan path must differ from the plan being applied".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Source and destination roots: explicit overrides, else the plan header
    pub fn roots(&self, document: &PlanDocument) -> Result<crate::executor::Roots, SyncError> {
        let source = root_for(self.source.as_deref(), document.source.as_deref(), "source", "--source")?;
        let dest = root_for(
            self.dest.as_deref(),
            document.destination.as_deref(),
            "destination",
            "--dest",
        )?;
        Ok(crate::executor::Roots::new(source, dest))
    }
}

fn root_for(
    explicit: Option<&Path>,
    from_plan: Option<&str>,
    label: &str,
    flag: &str,
) -> Result<PathBuf, SyncError> {
    let path = match (explicit, from_plan) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(header)) if !header.is_empty() => PathBuf::from(header),
        _ => {
            return Err(SyncError::Config(format!(
                "Plan names no {} directory; pass {}",
                label, flag
            )))
        }
    };
    absolutize(&path)
}
