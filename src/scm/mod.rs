//! Source-control port: where merge requests come from and comments go to.

pub mod gitlab;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ChangedFile, MergeRequest};

pub use gitlab::GitlabClient;

/// Errors from the source-control backend.
#[derive(Error, Debug)]
pub enum ScmError {
    #[error("merge request !{merge_request_id} not found in project {project_id}")]
    NotFound {
        project_id: u64,
        merge_request_id: u64,
    },

    #[error("{operation} failed with HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation} request failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("source control not configured: {0}")]
    NotConfigured(String),
}

/// Backend that hosts merge requests.
///
/// `get_merge_request` returns the metadata only; `changed_files` is
/// populated separately from `list_changed_files`.
#[async_trait]
pub trait SourceControl: Send + Sync {
    async fn get_merge_request(
        &self,
        project_id: u64,
        merge_request_id: u64,
    ) -> Result<MergeRequest, ScmError>;

    async fn list_changed_files(
        &self,
        project_id: u64,
        merge_request_id: u64,
    ) -> Result<Vec<ChangedFile>, ScmError>;

    /// Post `body` as a new comment on the merge request.
    async fn publish_comment(
        &self,
        project_id: u64,
        merge_request_id: u64,
        body: &str,
    ) -> Result<(), ScmError>;
}
