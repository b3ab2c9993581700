//! Plan text parsing and validation

use super::{Direction, ItemType, PlanDocument, PlanOperation};
use crate::types::SyncError;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, warn};

const SIZE_UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Parse plan text into a document
///
/// Lines are trimmed; blank lines are skipped and `#` lines are comments.
/// The `# Source:`, `# Destination:`, `# Mode:`, `# Include changes:` and
/// `# Exclude changes:` comments populate document metadata. Every other
/// line is an operation: `alias item-type path [size] [modified] [flags...]`.
///
/// # Errors
/// Returns `SyncError::Syntax` for the first operation line with fewer than
/// three tokens or an item type other than `file`/`dir`. Aliases are not
/// checked here; see [`validate_plan`].
pub fn parse_plan(text: &str) -> Result<PlanDocument, SyncError> {
    let mut document = PlanDocument::default();

    for (index, raw) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            read_metadata(line, &mut document);
            continue;
        }

        document
            .operations
            .push(parse_operation(line, line_number)?);
    }

    debug!(operations = document.operations.len(), "parsed plan");
    Ok(document)
}

fn read_metadata(line: &str, document: &mut PlanDocument) {
    let value = |prefix: &str| {
        line.strip_prefix(prefix)
            .map(|rest| rest.trim().to_string())
    };

    if let Some(source) = value("# Source:") {
        document.source = Some(source);
    } else if let Some(destination) = value("# Destination:") {
        document.destination = Some(destination);
    } else if let Some(mode) = value("# Mode:") {
        document.mode = Some(mode);
    } else if let Some(list) = value("# Include changes:") {
        document.include_changes = split_list(&list);
    } else if let Some(list) = value("# Exclude changes:") {
        document.exclude_changes = split_list(&list);
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_operation(line: &str, line_number: usize) -> Result<PlanOperation, SyncError> {
    let syntax_error = || SyncError::Syntax {
        line_number,
        line: line.to_string(),
    };

    let tokens = split_tokens(line).ok_or_else(syntax_error)?;
    if tokens.len() < 3 {
        return Err(syntax_error());
    }

    let item_type = ItemType::parse(&tokens[1]).ok_or_else(syntax_error)?;

    let mut rest = tokens[3..].iter().map(String::as_str).peekable();
    let size = rest.next().map(|first| match rest.peek() {
        // "1.5 KB" is written as two tokens
        Some(unit) if SIZE_UNITS.contains(unit) => {
            let joined = format!("{} {}", first, unit);
            rest.next();
            joined
        }
        _ => first.to_string(),
    });
    let modified = rest.next().map(String::from);
    let flags: Vec<&str> = rest.collect();

    Ok(PlanOperation {
        alias: tokens[0].clone(),
        item_type,
        path: tokens[2].clone(),
        size,
        modified,
        flags: (!flags.is_empty()).then(|| flags.join(" ")),
        line_number,
    })
}

/// Split on whitespace, reading `"..."` as one token with `\\`, `\"`, `\n`,
/// `\r` and `\t` escapes
///
/// `None` for an unterminated quote or an unknown escape.
fn split_tokens(line: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            loop {
                match chars.next()? {
                    '"' => break,
                    '\\' => token.push(match chars.next()? {
                        '\\' => '\\',
                        '"' => '"',
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        _ => return None,
                    }),
                    other => token.push(other),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Some(tokens)
}

/// Check every operation before anything is executed
///
/// # Errors
/// - `SyncError::UnknownAlias` for an alias outside the recognized set
/// - `SyncError::UnsafePath` for an empty path, an absolute path or one
///   containing `..`
pub fn validate_plan(document: &PlanDocument) -> Result<(), SyncError> {
    for op in &document.operations {
        if Direction::from_alias(&op.alias).is_none() {
            return Err(SyncError::UnknownAlias {
                line_number: op.line_number,
                alias: op.alias.clone(),
            });
        }
        if !is_safe_relative(&op.path) {
            return Err(SyncError::UnsafePath {
                line_number: op.line_number,
                path: op.path.clone(),
            });
        }
    }
    Ok(())
}

fn is_safe_relative(path: &str) -> bool {
    if path.is_empty() || path.starts_with('/') || path.starts_with('\\') {
        return false;
    }
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && !path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Read, parse and validate a plan file
///
/// A plan with no operations is valid and executes as a no-op.
///
/// # Errors
/// `SyncError::Io` if the file cannot be read, `SyncError::EmptyPlan` if it
/// has no content, plus anything [`parse_plan`] or [`validate_plan`] reports.
pub fn read_plan_file(path: &Path) -> Result<PlanDocument, SyncError> {
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Err(SyncError::EmptyPlan {
            path: path.to_path_buf(),
        });
    }

    let document = parse_plan(&text)?;
    validate_plan(&document)?;

    if document.operations.is_empty() {
        warn!(plan = %path.display(), "plan contains no operations");
    }
    Ok(document)
}
