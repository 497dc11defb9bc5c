//! Shared types used across all modules.
//!
//! This module defines the merge request entity, the conversation
//! transcript, and the run outcome. Other modules import from here
//! rather than reaching into each other's internals.

pub mod conversation;
pub mod diff;
pub mod merge_request;
pub mod review;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use conversation::{ConversationBox, ConversationError, Role, Turn};
pub use diff::ChangedFile;
pub use merge_request::{IgnoreReason, MergeRequest};
pub use review::{ReviewSummary, RunOutcome};

/// Language models the reviewer is allowed to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportedModel {
    #[default]
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
}

impl SupportedModel {
    pub const ALL: [SupportedModel; 2] = [SupportedModel::Gpt4o, SupportedModel::Gpt4oMini];

    /// The model identifier sent to the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            SupportedModel::Gpt4o => "gpt-4o",
            SupportedModel::Gpt4oMini => "gpt-4o-mini",
        }
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SupportedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SupportedModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "model '{s}' is not allowed. Supported: {}",
                    Self::supported_list()
                )
            })
    }
}

/// Identifies the merge request a run should review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    pub project_id: u64,
    pub merge_request_id: u64,
}

/// Malformed run input, rejected before any backend call.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("project id must be a positive integer")]
    ProjectId,

    #[error("merge request id must be a positive integer")]
    MergeRequestId,
}

impl ReviewInput {
    pub fn new(project_id: u64, merge_request_id: u64) -> Self {
        Self {
            project_id,
            merge_request_id,
        }
    }

    /// Both ids must be positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.project_id == 0 {
            return Err(ValidationError::ProjectId);
        }
        if self.merge_request_id == 0 {
            return Err(ValidationError::MergeRequestId);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_model_round_trips_through_str() {
        for model in SupportedModel::ALL {
            assert_eq!(model.as_str().parse::<SupportedModel>().unwrap(), model);
            assert_eq!(model.to_string(), model.as_str());
        }
    }

    #[test]
    fn unsupported_model_lists_alternatives() {
        let err = "gpt-3.5-turbo".parse::<SupportedModel>().unwrap_err();
        assert!(err.contains("gpt-3.5-turbo"));
        assert!(err.contains("gpt-4o, gpt-4o-mini"));
    }

    #[test]
    fn model_names_are_case_sensitive() {
        assert!("GPT-4o".parse::<SupportedModel>().is_err());
    }

    #[test]
    fn supported_model_serde_uses_backend_names() {
        let json = serde_json::to_string(&SupportedModel::Gpt4oMini).unwrap();
        assert_eq!(json, "\"gpt-4o-mini\"");
        let back: SupportedModel = serde_json::from_str("\"gpt-4o\"").unwrap();
        assert_eq!(back, SupportedModel::Gpt4o);
    }

    #[test]
    fn review_input_requires_positive_ids() {
        assert_eq!(ReviewInput::new(1, 1).validate(), Ok(()));
        assert_eq!(
            ReviewInput::new(0, 1).validate(),
            Err(ValidationError::ProjectId)
        );
        assert_eq!(
            ReviewInput::new(1, 0).validate(),
            Err(ValidationError::MergeRequestId)
        );
    }
}
