//! Role-tagged conversation transcript with a per-message input budget.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tokens::TokenCounter;

use super::SupportedModel;

/// Applied when a configured token limit is zero or negative.
pub const DEFAULT_TOKEN_LIMIT: u64 = 10_000;

/// Errors raised while building or reading a conversation.
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("{0}")]
    UnsupportedModel(String),

    #[error("token count ({count}) exceeds maximum allowed ({max})")]
    TokenLimitExceeded { count: u64, max: u64 },

    #[error("tokenizer unavailable: {0}")]
    Tokenizer(String),

    #[error("no assistant message found")]
    NoAssistantMessage,
}

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered transcript for one review run.
///
/// The first turn is always the system prompt. User messages are checked
/// against `max_input_tokens` before they are appended; a rejected message
/// leaves the transcript untouched.
#[derive(Debug)]
pub struct ConversationBox {
    turns: Vec<Turn>,
    model: SupportedModel,
    max_input_tokens: u64,
    max_output_tokens: u64,
    counter: TokenCounter,
}

fn limit_or_default(limit: i64) -> u64 {
    if limit <= 0 {
        DEFAULT_TOKEN_LIMIT
    } else {
        limit as u64
    }
}

impl ConversationBox {
    /// Start a transcript seeded with `system_prompt`.
    ///
    /// Non-positive limits fall back to [`DEFAULT_TOKEN_LIMIT`]. Fails when
    /// `model` is not one of [`SupportedModel::ALL`].
    pub fn new(
        system_prompt: &str,
        model: &str,
        max_input_tokens: i64,
        max_output_tokens: i64,
    ) -> Result<Self, ConversationError> {
        let model: SupportedModel = model
            .parse()
            .map_err(ConversationError::UnsupportedModel)?;
        let counter =
            TokenCounter::for_model(model.as_str()).map_err(ConversationError::Tokenizer)?;

        Ok(Self {
            turns: vec![Turn::system(system_prompt)],
            model,
            max_input_tokens: limit_or_default(max_input_tokens),
            max_output_tokens: limit_or_default(max_output_tokens),
            counter,
        })
    }

    /// Append a user turn if it fits within the input budget.
    pub fn add_user_message(&mut self, content: &str) -> Result<(), ConversationError> {
        let count = self.counter.count(content) as u64;
        if count > self.max_input_tokens {
            return Err(ConversationError::TokenLimitExceeded {
                count,
                max: self.max_input_tokens,
            });
        }
        tracing::debug!(tokens = count, max = self.max_input_tokens, "user message accepted");
        self.turns.push(Turn::user(content));
        Ok(())
    }

    /// Append an assistant turn. Not budget-checked.
    pub fn add_assistant_message(&mut self, content: &str) {
        self.turns.push(Turn::assistant(content));
    }

    /// Append turns returned by the model, preserving their order.
    pub fn append_messages(&mut self, turns: impl IntoIterator<Item = Turn>) {
        self.turns.extend(turns);
    }

    /// The most recent assistant turn.
    pub fn last_assistant_message(&self) -> Result<&Turn, ConversationError> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .ok_or(ConversationError::NoAssistantMessage)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn model(&self) -> SupportedModel {
        self.model
    }

    pub fn max_input_tokens(&self) -> u64 {
        self.max_input_tokens
    }

    pub fn max_output_tokens(&self) -> u64 {
        self.max_output_tokens
    }
}
