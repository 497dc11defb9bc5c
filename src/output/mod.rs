//! Output: the merge request comment body and the local run report (terminal, JSON).

pub mod comment;
pub mod json;
pub mod terminal;

use crate::models::RunOutcome;

/// Trait for rendering a run outcome to an output format.
pub trait OutputRenderer {
    /// Render the outcome to a string.
    fn render(&self, outcome: &RunOutcome) -> String;
}
