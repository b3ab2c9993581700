//! Change-type filtering

use crate::types::{Change, ChangeTag};

/// Include/exclude selection over change tags
///
/// An empty include list keeps everything. Exclusion is applied after
/// inclusion, so a tag named in both lists is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFilter {
    pub include: Vec<ChangeTag>,
    pub exclude: Vec<ChangeTag>,
}

/// Result of filtering, with the count needed for the plan summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredChanges {
    pub retained: Vec<Change>,
    pub total_before: usize,
}

impl FilteredChanges {
    /// Number of changes dropped by the filter
    pub fn filtered_out(&self) -> usize {
        self.total_before - self.retained.len()
    }

    /// Number of retained changes carrying `tag`
    pub fn count(&self, tag: ChangeTag) -> usize {
        self.retained.iter().filter(|c| c.tag() == tag).count()
    }
}

impl ChangeFilter {
    pub fn new(include: Vec<ChangeTag>, exclude: Vec<ChangeTag>) -> Self {
        Self { include, exclude }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Check a single change against both lists
    pub fn keeps(&self, change: &Change) -> bool {
        let tag = change.tag();
        let included =
            self.include.is_empty() || self.include.iter().any(|wanted| wanted.selects(tag));
        included && !self.exclude.iter().any(|unwanted| unwanted.selects(tag))
    }

    /// Apply the filter, preserving order
    pub fn apply(&self, changes: Vec<Change>) -> FilteredChanges {
        let total_before = changes.len();
        let retained = changes.into_iter().filter(|c| self.keeps(c)).collect();
        FilteredChanges {
            retained,
            total_before,
        }
    }
}
