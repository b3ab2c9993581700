//! Plan text rendering

use super::{Direction, ItemType, PlanDocument};
use crate::diff::FilteredChanges;
use crate::types::{Change, ChangeTag};
use chrono::{DateTime, Local};
use std::borrow::Cow;
use std::fmt::Write;

const UNITS: [&str; 6] = ["K", "M", "G", "T", "P", "E"];

const LEGEND: &str = "\
#
# Commands:
#   s2d, sync-to-dest, <<    - Sync from source to destination (source >> dest)
#   d2s, dest-to-source, >>  - Sync from destination to source (dest >> source)
#   bid, bidirectional, <>   - Sync in both directions (bidirectional)
#   skip                     - Skip this item (commented out)
#
# Visual aliases make direction intuitive:
#   << = source flows to dest (like << redirection)
#   >> = dest flows to source (like >> redirection)
#   <> = bidirectional flow (like <-> but shorter)
#
# Format: <command> <item-type> <path> [size] [modified] [flags]
";

/// Everything the header block of a plan echoes back
#[derive(Debug, Clone)]
pub struct PlanHeader {
    /// Written as `# Sync Plan Generated:`; injected so renders are reproducible
    pub generated_at: DateTime<Local>,
    /// Human description of the command that produced the plan
    pub invocation: String,
    pub source: String,
    pub destination: String,
    pub mode: String,
    pub include_changes: Vec<ChangeTag>,
    pub exclude_changes: Vec<ChangeTag>,
}

/// Render the full plan text for a filtered change list
///
/// The output is the header block, one operation line per retained change
/// in the order given, and a summary block. Re-rendering the same inputs
/// yields identical text.
pub fn render_plan(header: &PlanHeader, filtered: &FilteredChanges) -> String {
    let mut out = String::new();
    write_header(&mut out, header);

    for change in &filtered.retained {
        out.push_str(&format_operation_line(change));
        out.push('\n');
    }

    out.push_str("\n# Summary:\n");
    let _ = writeln!(out, "# Files matching filter: {}", filtered.retained.len());
    let _ = writeln!(out, "# New in source: {}", filtered.count(ChangeTag::NewInSource));
    let _ = writeln!(out, "# New in dest: {}", filtered.count(ChangeTag::NewInDest));
    let _ = writeln!(out, "# Updates: {}", filtered.count(ChangeTag::Updates));
    let _ = writeln!(out, "# Conflicts: {}", filtered.count(ChangeTag::Conflicts));
    if filtered.filtered_out() > 0 {
        let _ = writeln!(out, "# Filtered out: {}", filtered.filtered_out());
    }

    out
}

fn write_header(out: &mut String, header: &PlanHeader) {
    let _ = writeln!(
        out,
        "# Sync Plan Generated: {}",
        header.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "# Generated from: {}", header.invocation);
    let _ = writeln!(out, "# Source: {}", header.source);
    let _ = writeln!(out, "# Destination: {}", header.destination);
    let _ = writeln!(out, "# Mode: {}", header.mode);
    if !header.include_changes.is_empty() {
        let _ = writeln!(out, "# Include changes: {}", join_tags(&header.include_changes));
    }
    if !header.exclude_changes.is_empty() {
        let _ = writeln!(out, "# Exclude changes: {}", join_tags(&header.exclude_changes));
    }
    out.push_str(LEGEND);
    out.push('\n');
}

fn join_tags(tags: &[ChangeTag]) -> String {
    tags.iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One operation line, without the trailing newline
///
/// ```
/// use syncplan::plan::format_operation_line;
/// use syncplan::types::{Change, ChangeAction};
/// use std::time::SystemTime;
///
/// let change = Change {
///     action: ChangeAction::Create,
///     path: "docs/readme.md".to_string(),
///     size: 2048,
///     modified: SystemTime::now(),
///     is_dir: false,
/// };
/// let line = format_operation_line(&change);
/// assert!(line.starts_with("<< file docs/readme.md"));
/// assert!(line.contains("2.0 KB"));
/// assert!(line.ends_with("[new-in-source]"));
/// ```
pub fn format_operation_line(change: &Change) -> String {
    let item = if change.is_dir {
        ItemType::Dir
    } else {
        ItemType::File
    };
    let modified: DateTime<Local> = change.modified.into();
    format!(
        "{} {} {:<30} {:>8}  {}  {}",
        change.action.alias(),
        item.padded(),
        quote_path(&change.path),
        format_size(change.size),
        modified.format("%Y-%m-%dT%H:%M:%S"),
        change.action.flag()
    )
}

/// Path as written in an operation line
///
/// Paths holding whitespace or a double quote are double-quoted, with `\\`,
/// `"`, newline, carriage return and tab escaped; all others are written
/// bare.
///
/// ```
/// use syncplan::plan::quote_path;
///
/// assert_eq!(quote_path("docs/a.txt"), "docs/a.txt");
/// assert_eq!(quote_path("photos 2019.txt"), "\"photos 2019.txt\"");
/// ```
pub fn quote_path(path: &str) -> Cow<'_, str> {
    if !path.chars().any(|c| c.is_whitespace() || c == '"') {
        return Cow::Borrowed(path);
    }

    let mut quoted = String::with_capacity(path.len() + 2);
    quoted.push('"');
    for c in path.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

/// Human-readable size in powers of 1024
///
/// ```
/// use syncplan::plan::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1536), "1.5 KB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}B", value, UNITS[unit])
}

/// Render a plan holding only the bidirectional operations of `document`
///
/// Operations are written back with the tokens they were parsed from, so
/// hand-added flags such as `auto:backup` survive.
pub fn render_conflict_plan(document: &PlanDocument, generated_at: DateTime<Local>) -> String {
    let header = PlanHeader {
        generated_at,
        invocation: "conflicting operations of an existing plan".to_string(),
        source: document.source.clone().unwrap_or_default(),
        destination: document.destination.clone().unwrap_or_default(),
        mode: document.mode.clone().unwrap_or_default(),
        include_changes: Vec::new(),
        exclude_changes: Vec::new(),
    };

    let mut out = String::new();
    write_header(&mut out, &header);

    let mut count = 0;
    for op in document
        .operations
        .iter()
        .filter(|op| Direction::from_alias(&op.alias) == Some(Direction::Bidirectional))
    {
        let line = format!(
            "{} {} {:<30} {:>8}  {}  {}",
            op.alias,
            op.item_type.padded(),
            quote_path(&op.path),
            op.size.as_deref().unwrap_or(""),
            op.modified.as_deref().unwrap_or(""),
            op.flags.as_deref().unwrap_or("")
        );
        out.push_str(line.trim_end());
        out.push('\n');
        count += 1;
    }

    out.push_str("\n# Summary:\n");
    let _ = writeln!(out, "# Conflicts: {}", count);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChangeFilter;
    use crate::types::ChangeAction;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, UNIX_EPOCH};

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
            .single()
            .expect("unambiguous local time")
    }

    fn header() -> PlanHeader {
        PlanHeader {
            generated_at: fixed_time(),
            invocation: "syncplan plan --source /s --dest /d --output p.plan".to_string(),
            source: "/s".to_string(),
            destination: "/d".to_string(),
            mode: "one-way".to_string(),
            include_changes: Vec::new(),
            exclude_changes: Vec::new(),
        }
    }

    fn change(action: ChangeAction, path: &str, size: u64) -> Change {
        Change {
            action,
            path: path.to_string(),
            size,
            modified: UNIX_EPOCH + Duration::from_secs(1_700_000_000),
            is_dir: false,
        }
    }

    #[test]
    fn test_format_size_boundaries() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
        assert_eq!(format_size(u64::MAX), "16.0 EB");
    }

    #[test]
    fn test_operation_line_layout() {
        let line = format_operation_line(&change(ChangeAction::Update, "a.txt", 5));
        let modified: DateTime<Local> = (UNIX_EPOCH + Duration::from_secs(1_700_000_000)).into();
        let expected = format!(
            "<< file {:<30} {:>8}  {}  [update: newer-in-source]",
            "a.txt",
            "5 B",
            modified.format("%Y-%m-%dT%H:%M:%S")
        );
        assert_eq!(line, expected);
    }

    #[test]
    fn test_directory_item_is_padded() {
        let mut dir_change = change(ChangeAction::Conflict, "x", 0);
        dir_change.is_dir = true;
        assert!(format_operation_line(&dir_change).starts_with("<> dir  x"));
    }

    #[test]
    fn test_header_block() {
        let text = render_plan(&header(), &ChangeFilter::default().apply(Vec::new()));
        let expected_start = "\
# Sync Plan Generated: 2024-05-01 12:30:00
# Generated from: syncplan plan --source /s --dest /d --output p.plan
# Source: /s
# Destination: /d
# Mode: one-way
#
# Commands:
";
        assert!(text.starts_with(expected_start), "got:\n{}", text);
        assert!(text.contains("# Format: <command> <item-type> <path> [size] [modified] [flags]\n\n"));
        assert!(!text.contains("# Include changes:"));
    }

    #[test]
    fn test_filter_lists_echoed() {
        let mut h = header();
        h.include_changes = vec![ChangeTag::NewInSource, ChangeTag::Updates];
        h.exclude_changes = vec![ChangeTag::Conflicts];
        let text = render_plan(&h, &ChangeFilter::default().apply(Vec::new()));
        assert!(text.contains("# Include changes: new-in-source, updates\n"));
        assert!(text.contains("# Exclude changes: conflicts\n"));
    }

    #[test]
    fn test_summary_block() {
        let changes = vec![
            change(ChangeAction::Create, "a", 1),
            change(ChangeAction::Create, "b", 1),
            change(ChangeAction::Delete, "c", 1),
            change(ChangeAction::Conflict, "d", 1),
        ];
        let filter = ChangeFilter::new(vec![], vec![ChangeTag::NewInDest]);
        let text = render_plan(&header(), &filter.apply(changes));

        let summary = text.split("\n# Summary:\n").nth(1).expect("summary present");
        assert_eq!(
            summary,
            "\
# Files matching filter: 3
# New in source: 2
# New in dest: 0
# Updates: 0
# Conflicts: 1
# Filtered out: 1
"
        );
    }

    #[test]
    fn test_no_filtered_out_line_when_nothing_dropped() {
        let text = render_plan(
            &header(),
            &ChangeFilter::default().apply(vec![change(ChangeAction::Create, "a", 1)]),
        );
        assert!(!text.contains("Filtered out"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let changes = vec![
            change(ChangeAction::Create, "a", 10),
            change(ChangeAction::Update, "b", 2048),
        ];
        let first = render_plan(&header(), &ChangeFilter::default().apply(changes.clone()));
        let second = render_plan(&header(), &ChangeFilter::default().apply(changes));
        assert_eq!(first, second);
    }

    #[test]
    fn test_paths_with_whitespace_survive_parsing() {
        for path in ["photos 2019.txt", "tab\there", "quote\"d", "trailing /x y"] {
            let line = format_operation_line(&change(ChangeAction::Create, path, 10));
            assert!(line.starts_with("<< file \""), "unquoted: {}", line);

            let doc = crate::plan::parse_plan(&line).unwrap();
            assert_eq!(doc.operations[0].path, path);
            assert_eq!(doc.operations[0].size.as_deref(), Some("10 B"));
            assert_eq!(doc.operations[0].flags.as_deref(), Some("[new-in-source]"));
        }
    }

    #[test]
    fn test_plain_paths_stay_bare() {
        assert_eq!(quote_path("docs/read-me_v2.md"), "docs/read-me_v2.md");
        assert_eq!(quote_path("a\\b"), "a\\b");
    }
}
