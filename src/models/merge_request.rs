//! The merge request under review and the ignore-review rule.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::IGNORE_MARKER;
use crate::filter::PathFilter;

use super::diff::ChangedFile;

/// Why a merge request was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The description carries the opt-out marker.
    Marker,
    /// Nothing is left to review after path filtering.
    NoChanges,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::Marker => write!(f, "description contains '{IGNORE_MARKER}'"),
            IgnoreReason::NoChanges => write!(f, "no reviewable changes after filtering"),
        }
    }
}

/// In-memory merge request plus its changed files.
///
/// `change_summary_note` and `release_note` stay empty until the
/// corresponding summarization step succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    pub id: u64,
    pub project_id: u64,
    pub title: String,
    pub description: String,
    pub base_revision: String,
    pub head_revision: String,
    pub changed_files: Vec<ChangedFile>,
    pub change_summary_note: String,
    pub release_note: String,
}

impl MergeRequest {
    /// Drop changed files whose new path matches `filter`. Returns how many were removed.
    pub fn filter_paths(&mut self, filter: &PathFilter) -> usize {
        let files = std::mem::take(&mut self.changed_files);
        let (kept, removed) = filter.filter(files);
        self.changed_files = kept;
        removed
    }

    /// The reason this merge request should be skipped, if any.
    ///
    /// Must be evaluated after [`filter_paths`](Self::filter_paths): an
    /// emptied change set counts as nothing to review.
    pub fn ignore_reason(&self) -> Option<IgnoreReason> {
        if self.description.contains(IGNORE_MARKER) {
            Some(IgnoreReason::Marker)
        } else if self.changed_files.is_empty() {
            Some(IgnoreReason::NoChanges)
        } else {
            None
        }
    }

    pub fn ignore_review(&self) -> bool {
        self.ignore_reason().is_some()
    }
}
