//! Terminal renderer: the generated texts with light styling.

use colored::Colorize;

use crate::models::RunOutcome;
use crate::output::OutputRenderer;

/// Terminal output renderer.
pub struct TerminalRenderer;

impl OutputRenderer for TerminalRenderer {
    fn render(&self, outcome: &RunOutcome) -> String {
        match outcome {
            RunOutcome::Ignored { reason } => {
                format!("  {} Review skipped: {reason}.\n", "ℹ".blue().bold())
            }
            RunOutcome::Completed(summary) => {
                let mut output = String::new();
                output.push_str(&format!("{}\n\n", "Change summary".bold().underline()));
                output.push_str(summary.change_summary.trim_end());
                output.push_str("\n\n");
                output.push_str(&format!("{}\n\n", "Release note".bold().underline()));
                output.push_str(summary.release_note.trim_end());
                output.push('\n');
                output.push_str(&format!("{}\n", "───────────────────────────────────".dimmed()));
                output.push_str(&format!(
                    " {} Comment published to the merge request.\n",
                    "✔".green().bold()
                ));
                output
            }
        }
    }
}
