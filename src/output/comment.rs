//! Merge request comment body published after a successful review.

use crate::constants::{BOT_IDENTITY, IGNORE_MARKER};

const SEPARATOR: &str = "\n---\n";

/// Build the note: bot header, change summary, release note, then the opt-out footer.
pub fn render_comment(change_summary: &str, release_note: &str) -> String {
    let mut body = String::with_capacity(change_summary.len() + release_note.len() + 256);
    body.push_str(BOT_IDENTITY);
    body.push_str("\n\n");
    body.push_str(change_summary);
    body.push_str(SEPARATOR);
    body.push_str(release_note);
    body.push_str(SEPARATOR);
    body.push_str(&format!(
        "### Ignoring further reviews\n- Type `{IGNORE_MARKER}` anywhere in the MR description \
         to ignore further reviews from the bot."
    ));
    body
}
