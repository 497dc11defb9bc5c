//! JSON output renderer.
//!
//! Outputs the tagged outcome, e.g. `{"status": "completed", "change_summary": ..., "release_note": ...}`.

use crate::models::RunOutcome;
use crate::output::OutputRenderer;

/// JSON output renderer.
pub struct JsonRenderer;

impl OutputRenderer for JsonRenderer {
    fn render(&self, outcome: &RunOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
    }
}
