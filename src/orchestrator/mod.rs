//! Review orchestrator: fetch, filter, ignore check, two-step summarization, publish.
//!
//! A run is strictly sequential. Each language-model call carries its own
//! deadline, and [`ReviewOrchestrator::run_with_deadline`] bounds the whole
//! run. A cancelled run never publishes: the comment is only posted after
//! both summaries exist.

pub mod prompt;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::filter::PathFilter;
use crate::models::{
    ConversationBox, ConversationError, ReviewInput, ReviewSummary, RunOutcome, SupportedModel,
    ValidationError,
};
use crate::output::comment::render_comment;
use crate::providers::{CompletionRequest, LanguageModel, ProviderError};
use crate::scm::{ScmError, SourceControl};

/// Pipeline step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStage {
    Fetch,
    SummarizeChanges,
    SummarizeReleaseNote,
    Publish,
}

impl fmt::Display for ReviewStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewStage::Fetch => write!(f, "fetch merge request"),
            ReviewStage::SummarizeChanges => write!(f, "summarize changes"),
            ReviewStage::SummarizeReleaseNote => write!(f, "summarize release note"),
            ReviewStage::Publish => write!(f, "publish comment"),
        }
    }
}

/// Errors from a review run.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("{stage}: {source}")]
    SourceControl {
        stage: ReviewStage,
        #[source]
        source: ScmError,
    },

    #[error("{stage}: {source}")]
    LanguageModel {
        stage: ReviewStage,
        #[source]
        source: ProviderError,
    },

    #[error("{stage}: {source}")]
    Conversation {
        stage: ReviewStage,
        #[source]
        source: ConversationError,
    },

    #[error("{stage}: failed to build prompt: {source}")]
    Prompt {
        stage: ReviewStage,
        #[source]
        source: serde_json::Error,
    },

    #[error("{stage}: language model did not answer within {after:?}")]
    Timeout { stage: ReviewStage, after: Duration },

    #[error("review did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

impl ReviewError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ReviewError::Validation(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ReviewError::Config(_))
    }

    /// The stage the error was raised in, when it is tied to one.
    pub fn stage(&self) -> Option<ReviewStage> {
        match self {
            ReviewError::SourceControl { stage, .. }
            | ReviewError::LanguageModel { stage, .. }
            | ReviewError::Conversation { stage, .. }
            | ReviewError::Prompt { stage, .. }
            | ReviewError::Timeout { stage, .. } => Some(*stage),
            ReviewError::Config(_)
            | ReviewError::Validation(_)
            | ReviewError::DeadlineExceeded(_) => None,
        }
    }
}

/// Everything the orchestrator needs from configuration, passed in explicitly.
#[derive(Debug, Clone)]
pub struct ReviewSettings {
    pub system_message: String,
    pub model: String,
    pub max_input_tokens: i64,
    pub max_output_tokens: i64,
    pub path_filters: Vec<String>,
    pub llm_timeout: Duration,
}

impl ReviewSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            system_message: config.llm.system_message.clone(),
            model: config.llm.model.clone(),
            max_input_tokens: config.llm.max_input_tokens,
            max_output_tokens: config.llm.max_output_tokens,
            path_filters: config.gitlab.path_filters.clone(),
            llm_timeout: config.review.llm_timeout(),
        }
    }
}

/// Runs the review pipeline for one merge request at a time.
pub struct ReviewOrchestrator {
    scm: Arc<dyn SourceControl>,
    llm: Arc<dyn LanguageModel>,
    filter: PathFilter,
    settings: ReviewSettings,
}

impl ReviewOrchestrator {
    /// Compile the path filters and check the model up front.
    pub fn new(
        scm: Arc<dyn SourceControl>,
        llm: Arc<dyn LanguageModel>,
        settings: ReviewSettings,
    ) -> Result<Self, ReviewError> {
        let filter = PathFilter::new(&settings.path_filters)
            .map_err(|e| ReviewError::Config(e.to_string()))?;
        settings
            .model
            .parse::<SupportedModel>()
            .map_err(ReviewError::Config)?;

        Ok(Self {
            scm,
            llm,
            filter,
            settings,
        })
    }

    /// Run the pipeline, aborting with [`ReviewError::DeadlineExceeded`] after `deadline`.
    pub async fn run_with_deadline(
        &self,
        input: ReviewInput,
        deadline: Duration,
    ) -> Result<RunOutcome, ReviewError> {
        tokio::time::timeout(deadline, self.run(input))
            .await
            .map_err(|_| ReviewError::DeadlineExceeded(deadline))?
    }

    /// Review a merge request and publish the result as a comment.
    ///
    /// Returns [`RunOutcome::Ignored`] without calling the language model
    /// when the merge request opts out or has nothing left after filtering.
    pub async fn run(&self, input: ReviewInput) -> Result<RunOutcome, ReviewError> {
        input.validate()?;
        let ReviewInput {
            project_id,
            merge_request_id,
        } = input;
        info!(project_id, merge_request_id, "reviewing merge request");

        let fetch_err = |source| ReviewError::SourceControl {
            stage: ReviewStage::Fetch,
            source,
        };
        let mut mr = self
            .scm
            .get_merge_request(project_id, merge_request_id)
            .await
            .map_err(fetch_err)?;
        mr.changed_files = self
            .scm
            .list_changed_files(project_id, merge_request_id)
            .await
            .map_err(fetch_err)?;

        let fetched = mr.changed_files.len();
        let removed = mr.filter_paths(&self.filter);
        debug!(fetched, removed, kept = mr.changed_files.len(), "applied path filters");

        if let Some(reason) = mr.ignore_reason() {
            info!(project_id, merge_request_id, %reason, "skipping review");
            return Ok(RunOutcome::Ignored { reason });
        }

        let mut conversation = ConversationBox::new(
            &self.settings.system_message,
            &self.settings.model,
            self.settings.max_input_tokens,
            self.settings.max_output_tokens,
        )
        .map_err(|source| ReviewError::Conversation {
            stage: ReviewStage::SummarizeChanges,
            source,
        })?;

        let changes_prompt =
            prompt::change_summary_prompt(&mr).map_err(|source| ReviewError::Prompt {
                stage: ReviewStage::SummarizeChanges,
                source,
            })?;
        mr.change_summary_note = self
            .converse(&mut conversation, &changes_prompt, ReviewStage::SummarizeChanges)
            .await?;

        mr.release_note = self
            .converse(
                &mut conversation,
                prompt::RELEASE_NOTE_PROMPT,
                ReviewStage::SummarizeReleaseNote,
            )
            .await?;

        let body = render_comment(&mr.change_summary_note, &mr.release_note);
        self.scm
            .publish_comment(project_id, merge_request_id, &body)
            .await
            .map_err(|source| ReviewError::SourceControl {
                stage: ReviewStage::Publish,
                source,
            })?;
        info!(project_id, merge_request_id, "review comment published");

        Ok(RunOutcome::Completed(ReviewSummary {
            change_summary: mr.change_summary_note,
            release_note: mr.release_note,
        }))
    }

    /// Add `prompt` as a user turn, ask the model, fold its turns back in,
    /// and return the latest assistant text.
    async fn converse(
        &self,
        conversation: &mut ConversationBox,
        prompt: &str,
        stage: ReviewStage,
    ) -> Result<String, ReviewError> {
        let conversation_err = |source| ReviewError::Conversation { stage, source };
        let model_err = |source| ReviewError::LanguageModel { stage, source };

        conversation
            .add_user_message(prompt)
            .map_err(conversation_err)?;

        let request = CompletionRequest {
            model: conversation.model().as_str(),
            turns: conversation.turns(),
            max_output_tokens: conversation.max_output_tokens(),
        };
        debug!(%stage, turns = request.turns.len(), "calling language model");

        let after = self.settings.llm_timeout;
        let call = async {
            match stage {
                ReviewStage::SummarizeReleaseNote => self.llm.summarize_release_note(&request).await,
                _ => self.llm.summarize_changes(&request).await,
            }
        };
        let completion = tokio::time::timeout(after, call)
            .await
            .map_err(|_| ReviewError::Timeout { stage, after })?
            .map_err(model_err)?;

        if completion.turns.is_empty() {
            return Err(model_err(ProviderError::EmptyResponse));
        }
        conversation.append_messages(completion.turns);

        let reply = conversation
            .last_assistant_message()
            .map_err(conversation_err)?;
        debug!(%stage, chars = reply.content.len(), "language model replied");
        Ok(reply.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_are_readable() {
        assert_eq!(ReviewStage::Fetch.to_string(), "fetch merge request");
        assert_eq!(
            ReviewStage::SummarizeReleaseNote.to_string(),
            "summarize release note"
        );
    }

    #[test]
    fn errors_carry_their_stage() {
        let err = ReviewError::LanguageModel {
            stage: ReviewStage::SummarizeChanges,
            source: ProviderError::EmptyResponse,
        };
        assert_eq!(err.stage(), Some(ReviewStage::SummarizeChanges));
        assert_eq!(
            err.to_string(),
            "summarize changes: response has no choices"
        );
        assert!(!err.is_config());

        let err = ReviewError::from(ValidationError::ProjectId);
        assert!(err.is_validation());
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn settings_come_from_config() {
        let mut config = Config::default();
        config.gitlab.path_filters = vec![r".*\.lock".into()];
        config.llm.max_input_tokens = 123;
        config.review.llm_timeout_secs = 5;
        let settings = ReviewSettings::from_config(&config);
        assert_eq!(settings.path_filters, vec![r".*\.lock"]);
        assert_eq!(settings.max_input_tokens, 123);
        assert_eq!(settings.llm_timeout, Duration::from_secs(5));
        assert_eq!(settings.model, "gpt-4o");
    }
}
