//! LanguageModel trait and LLM integration.
//!
//! Provides an abstraction layer over rig-core so the review pipeline
//! only deals in transcripts of [`Turn`]s.

pub mod rig;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Turn;

/// Errors from the language-model backend.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("response has no choices")]
    EmptyResponse,

    #[error("invalid transcript: {0}")]
    InvalidTranscript(String),
}

/// A non-streaming completion request over the full transcript so far.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub turns: &'a [Turn],
    pub max_output_tokens: u64,
}

/// Candidate turns returned by the backend, in order.
///
/// An implementation that receives zero candidates must return
/// [`ProviderError::EmptyResponse`] rather than an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub turns: Vec<Turn>,
}

/// Backend that produces the change summary and release note.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn summarize_changes(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<Completion, ProviderError>;

    async fn summarize_release_note(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<Completion, ProviderError>;
}
