//! Prompt construction for the two summarization steps.

use crate::models::MergeRequest;

/// Follow-up prompt for the release note, sent on the same conversation.
pub const RELEASE_NOTE_PROMPT: &str = "Create concise release notes in `markdown` format for \
this pull request, focusing on its purpose and user story. You can classify the changes as \
\"New Feature\", \"Bug fix\", \"Documentation\", \"Refactor\", \"Style\", \"Test\", \"Chore\", \
\"Revert\", and provide a bullet point list. For example: \"New Feature: An integrations page \
was added to the UI\". Keep your response within 50-100 words. Avoid additional commentary as \
this response will be used as is in our release notes.\n\n\
Below the release notes, generate a short, celebratory poem about the changes in this PR and \
add this poem as a quote (> symbol). You can use emojis in the poem, where they are relevant.";

const CHANGE_SUMMARY_INSTRUCTIONS: &str = "Provide your final response in the `markdown` format \
with the following content:\n\
- Summary (comment on the overall change instead of specific files within 80 words)\n\
- Table of files and their summaries. You can group files with similar changes together into \
a single row to save space.\n\n\
Avoid additional commentary as this summary will be added as a comment on the GitHub pull \
request.";

/// Build the change-summary prompt for a (filtered) merge request.
///
/// The changed files are embedded as their JSON serialization.
pub fn change_summary_prompt(mr: &MergeRequest) -> Result<String, serde_json::Error> {
    let files = serde_json::to_string(&mr.changed_files)?;
    Ok(format!(
        "{CHANGE_SUMMARY_INSTRUCTIONS}\n\n\
         ## Merge Request Title\n`{title}`\n\n\
         ## Description\n```\n{description}\n```\n\n\
         ## Diff\n```\n{files}\n```",
        title = mr.title,
        description = mr.description,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangedFile;

    #[test]
    fn change_summary_embeds_title_description_and_files() {
        let mr = MergeRequest {
            title: "Add login".into(),
            description: "Adds the login form.".into(),
            changed_files: vec![ChangedFile::modified("src/login.rs", "+fn login() {}")],
            ..Default::default()
        };
        let prompt = change_summary_prompt(&mr).unwrap();

        assert!(prompt.starts_with("Provide your final response in the `markdown` format"));
        assert!(prompt.contains("## Merge Request Title\n`Add login`\n"));
        assert!(prompt.contains("## Description\n```\nAdds the login form.\n```"));
        assert!(prompt.contains(r#""new_path":"src/login.rs""#));
        assert!(prompt.ends_with("```"));
    }

    #[test]
    fn release_note_prompt_asks_for_categories_and_poem() {
        assert!(RELEASE_NOTE_PROMPT.contains("\"Bug fix\""));
        assert!(RELEASE_NOTE_PROMPT.contains("50-100 words"));
        assert!(RELEASE_NOTE_PROMPT.contains("poem"));
    }
}
