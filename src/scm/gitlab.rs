//! GitLab REST API (v4) client.
//!
//! Every request carries the `PRIVATE-TOKEN` header. Non-success statuses
//! are surfaced with the response body so API errors stay diagnosable.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::GitlabConfig;
use crate::models::{ChangedFile, MergeRequest};

use super::{ScmError, SourceControl};

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

#[derive(Debug, Deserialize)]
struct MergeRequestDto {
    iid: u64,
    project_id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    diff_refs: Option<DiffRefsDto>,
}

#[derive(Debug, Deserialize)]
struct DiffRefsDto {
    #[serde(default)]
    base_sha: Option<String>,
    #[serde(default)]
    head_sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiffDto {
    #[serde(default)]
    diff: String,
    new_path: String,
    old_path: String,
    #[serde(default)]
    new_file: bool,
    #[serde(default)]
    renamed_file: bool,
    #[serde(default)]
    deleted_file: bool,
}

impl From<DiffDto> for ChangedFile {
    fn from(dto: DiffDto) -> Self {
        ChangedFile {
            diff: dto.diff,
            new_path: dto.new_path,
            old_path: dto.old_path,
            is_new: dto.new_file,
            is_renamed: dto.renamed_file,
            is_deleted: dto.deleted_file,
        }
    }
}

impl From<MergeRequestDto> for MergeRequest {
    fn from(dto: MergeRequestDto) -> Self {
        let (base_revision, head_revision) = dto
            .diff_refs
            .map(|r| (r.base_sha.unwrap_or_default(), r.head_sha.unwrap_or_default()))
            .unwrap_or_default();
        MergeRequest {
            id: dto.iid,
            project_id: dto.project_id,
            title: dto.title,
            description: dto.description.unwrap_or_default(),
            base_revision,
            head_revision,
            ..Default::default()
        }
    }
}

/// Talks to a GitLab instance over HTTP.
pub struct GitlabClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for GitlabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitlabClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl GitlabClient {
    /// Build a client from the `[gitlab]` config section.
    pub fn new(config: &GitlabConfig) -> Result<Self, ScmError> {
        let base_url = config
            .url
            .as_deref()
            .ok_or_else(|| ScmError::NotConfigured("GitLab URL is not set".into()))?;
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| ScmError::NotConfigured("GitLab token is not set".into()))?;
        Ok(Self::with_base_url(base_url, token))
    }

    pub fn with_base_url(base_url: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn merge_request_url(&self, project_id: u64, merge_request_id: u64) -> String {
        format!(
            "{}/api/v4/projects/{project_id}/merge_requests/{merge_request_id}",
            self.base_url
        )
    }

    async fn get(
        &self,
        url: &str,
        operation: &'static str,
    ) -> Result<reqwest::Response, ScmError> {
        tracing::debug!(%url, operation, "GitLab request");
        self.http
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|source| ScmError::Http { operation, source })
    }
}

async fn status_error(operation: &'static str, response: reqwest::Response) -> ScmError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(operation, status, %body, "GitLab returned an error status");
    ScmError::Status {
        operation,
        status,
        body,
    }
}

#[async_trait]
impl SourceControl for GitlabClient {
    async fn get_merge_request(
        &self,
        project_id: u64,
        merge_request_id: u64,
    ) -> Result<MergeRequest, ScmError> {
        let operation = "get merge request";
        let url = self.merge_request_url(project_id, merge_request_id);
        let response = self.get(&url, operation).await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(ScmError::NotFound {
                    project_id,
                    merge_request_id,
                });
            }
            _ => return Err(status_error(operation, response).await),
        }

        let dto: MergeRequestDto = response
            .json()
            .await
            .map_err(|source| ScmError::Decode { operation, source })?;
        Ok(dto.into())
    }

    async fn list_changed_files(
        &self,
        project_id: u64,
        merge_request_id: u64,
    ) -> Result<Vec<ChangedFile>, ScmError> {
        let operation = "list merge request diffs";
        let url = format!(
            "{}/diffs",
            self.merge_request_url(project_id, merge_request_id)
        );
        let response = self.get(&url, operation).await?;
        if response.status() != StatusCode::OK {
            return Err(status_error(operation, response).await);
        }

        let diffs: Vec<DiffDto> = response
            .json()
            .await
            .map_err(|source| ScmError::Decode { operation, source })?;
        Ok(diffs.into_iter().map(ChangedFile::from).collect())
    }

    async fn publish_comment(
        &self,
        project_id: u64,
        merge_request_id: u64,
        body: &str,
    ) -> Result<(), ScmError> {
        let operation = "create merge request note";
        let url = format!(
            "{}/notes",
            self.merge_request_url(project_id, merge_request_id)
        );
        tracing::debug!(%url, bytes = body.len(), "posting merge request note");

        let response = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, &self.token)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(|source| ScmError::Http { operation, source })?;

        if response.status() != StatusCode::CREATED {
            return Err(status_error(operation, response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    const TOKEN: &str = "glpat-test";

    #[tokio::test]
    async fn fetches_merge_request_metadata() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v4/projects/42/merge_requests/7")
            .match_header(TOKEN_HEADER, TOKEN)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "id": 9001,
                    "iid": 7,
                    "project_id": 42,
                    "title": "Add login page",
                    "description": "Implements the login form.",
                    "diff_refs": { "base_sha": "abc", "head_sha": "def", "start_sha": "abc" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GitlabClient::with_base_url(&server.url(), TOKEN);
        let mr = client.get_merge_request(42, 7).await.unwrap();
        assert_eq!(mr.id, 7);
        assert_eq!(mr.project_id, 42);
        assert_eq!(mr.title, "Add login page");
        assert_eq!(mr.description, "Implements the login form.");
        assert_eq!(mr.base_revision, "abc");
        assert_eq!(mr.head_revision, "def");
        assert!(mr.changed_files.is_empty());
    }

    #[tokio::test]
    async fn null_description_becomes_empty() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v4/projects/1/merge_requests/2")
            .with_status(200)
            .with_body(r#"{"iid":2,"project_id":1,"title":"t","description":null,"diff_refs":null}"#)
            .create_async()
            .await;

        let client = GitlabClient::with_base_url(&server.url(), TOKEN);
        let mr = client.get_merge_request(1, 2).await.unwrap();
        assert_eq!(mr.description, "");
        assert_eq!(mr.base_revision, "");
    }

    #[tokio::test]
    async fn missing_merge_request_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v4/projects/42/merge_requests/99")
            .with_status(404)
            .with_body(r#"{"message":"404 Not found"}"#)
            .create_async()
            .await;

        let client = GitlabClient::with_base_url(&server.url(), TOKEN);
        let err = client.get_merge_request(42, 99).await.unwrap_err();
        assert!(matches!(
            err,
            ScmError::NotFound {
                project_id: 42,
                merge_request_id: 99
            }
        ));
    }

    #[tokio::test]
    async fn unauthorized_carries_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v4/projects/42/merge_requests/7")
            .with_status(401)
            .with_body(r#"{"message":"401 Unauthorized"}"#)
            .create_async()
            .await;

        let client = GitlabClient::with_base_url(&server.url(), "wrong");
        match client.get_merge_request(42, 7).await.unwrap_err() {
            ScmError::Status { status, body, .. } => {
                assert_eq!(status, 401);
                assert!(body.contains("Unauthorized"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn lists_changed_files_in_order() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v4/projects/42/merge_requests/7/diffs")
            .match_header(TOKEN_HEADER, TOKEN)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!([
                    {
                        "diff": "@@ -1 +1 @@\n-a\n+b\n",
                        "new_path": "main.go",
                        "old_path": "main.go",
                        "a_mode": "100644",
                        "b_mode": "100644",
                        "new_file": false,
                        "renamed_file": false,
                        "deleted_file": false
                    },
                    {
                        "diff": "",
                        "new_path": "pkg/new.go",
                        "old_path": "pkg/old.go",
                        "new_file": false,
                        "renamed_file": true,
                        "deleted_file": false
                    }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let client = GitlabClient::with_base_url(&server.url(), TOKEN);
        let files = client.list_changed_files(42, 7).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].new_path, "main.go");
        assert_eq!(files[0].diff, "@@ -1 +1 @@\n-a\n+b\n");
        assert_eq!(files[1].old_path, "pkg/old.go");
        assert!(files[1].is_renamed);
    }

    #[tokio::test]
    async fn publishes_note_and_expects_created() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v4/projects/42/merge_requests/7/notes")
            .match_header(TOKEN_HEADER, TOKEN)
            .match_body(Matcher::Json(serde_json::json!({ "body": "hello" })))
            .with_status(201)
            .with_body(r#"{"id":1}"#)
            .create_async()
            .await;

        let client = GitlabClient::with_base_url(&format!("{}/", server.url()), TOKEN);
        client.publish_comment(42, 7, "hello").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn publish_rejects_non_created_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/api/v4/projects/42/merge_requests/7/notes")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = GitlabClient::with_base_url(&server.url(), TOKEN);
        let err = client.publish_comment(42, 7, "hello").await.unwrap_err();
        assert!(matches!(err, ScmError::Status { status: 200, .. }));
    }

    #[test]
    fn new_requires_url_and_token() {
        let mut config = GitlabConfig::default();
        assert!(matches!(
            GitlabClient::new(&config),
            Err(ScmError::NotConfigured(_))
        ));
        config.url = Some("https://gitlab.example.com".into());
        assert!(GitlabClient::new(&config).is_err());
        config.token = Some("t".into());
        let client = GitlabClient::new(&config).unwrap();
        assert!(!format!("{client:?}").contains("\"t\""));
    }
}
