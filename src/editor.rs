//! Editor selection and launch for interactive plan review

use crate::types::SyncError;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Editors tried, in order, when neither an override nor the environment names one
pub const FALLBACK_EDITORS: [&str; 5] = ["vim", "vi", "nano", "emacs", "code"];

type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;
type PathLookup = Box<dyn Fn(&str) -> Option<PathBuf>>;

/// Decides which editor opens a plan
///
/// Order: explicit override, `VISUAL`, `EDITOR`, then the first fallback
/// editor found on `PATH`. Both lookups are injectable for tests.
pub struct EditorSelector {
    override_editor: Option<String>,
    env: EnvLookup,
    find_on_path: PathLookup,
}

impl EditorSelector {
    /// Selector reading the process environment and `PATH`
    pub fn from_env(override_editor: Option<String>) -> Self {
        Self::with_lookups(
            override_editor,
            |key| std::env::var(key).ok(),
            |program| which::which(program).ok(),
        )
    }

    pub fn with_lookups(
        override_editor: Option<String>,
        env: impl Fn(&str) -> Option<String> + 'static,
        find_on_path: impl Fn(&str) -> Option<PathBuf> + 'static,
    ) -> Self {
        Self {
            override_editor,
            env: Box::new(env),
            find_on_path: Box::new(find_on_path),
        }
    }

    /// The editor command to run
    ///
    /// # Errors
    /// `SyncError::Editor` when nothing is configured and no fallback is installed.
    pub fn select(&self) -> Result<String, SyncError> {
        let configured = self
            .override_editor
            .clone()
            .or_else(|| (self.env)("VISUAL"))
            .or_else(|| (self.env)("EDITOR"))
            .filter(|editor| !editor.trim().is_empty());
        if let Some(editor) = configured {
            return Ok(editor);
        }

        FALLBACK_EDITORS
            .iter()
            .copied()
            .find(|candidate| (self.find_on_path)(*candidate).is_some())
            .map(String::from)
            .ok_or_else(|| {
                SyncError::Editor(
                    "no editor found; set EDITOR or pass --editor".to_string(),
                )
            })
    }
}

/// Run `editor` on `file_path` and wait for it to exit
///
/// `editor` may carry arguments (`code --wait`); it is first tried as a
/// single program name and then split on whitespace.
pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), SyncError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => check_status(editor, status),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(SyncError::Editor("empty editor command".into()));
            };

            let status = Command::new(program)
                .args(parts)
                .arg(file_path)
                .status()
                .map_err(|e| SyncError::Editor(format!("failed to start `{editor}`: {e}")))?;
            check_status(editor, status)
        }
        Err(err) => Err(SyncError::Io(err)),
    }
}

fn check_status(editor: &str, status: std::process::ExitStatus) -> Result<(), SyncError> {
    if status.success() {
        Ok(())
    } else {
        Err(SyncError::Editor(format!(
            "`{editor}` exited with status {status}"
        )))
    }
}
