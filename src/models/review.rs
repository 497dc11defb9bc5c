//! Results of a review run.

use serde::{Deserialize, Serialize};

use super::merge_request::IgnoreReason;

/// The two texts produced for a merge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub change_summary: String,
    pub release_note: String,
}

/// How a successful run ended. Failures are the `Err` side of the run result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Both summaries were generated and published.
    Completed(ReviewSummary),
    /// The merge request was skipped; nothing was generated or published.
    Ignored { reason: IgnoreReason },
}

impl RunOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, RunOutcome::Ignored { .. })
    }
}
