//! rig-core integration for transcript-based completions.
//!
//! Uses rig-core's OpenAI completions client, optionally pointed at a custom
//! base URL for OpenAI-compatible gateways. The transcript is mapped onto
//! rig's agent abstraction: the system turn becomes the preamble, earlier
//! turns become chat history, and the trailing user turn is the prompt.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{CompletionError, Message, Prompt, PromptError};
use rig::providers;

use crate::config::LlmConfig;
use crate::models::{Role, Turn};

use super::{Completion, CompletionRequest, LanguageModel, ProviderError};

/// A transcript split into the pieces rig's agent API expects.
#[derive(Debug, PartialEq, Eq)]
struct SplitTranscript<'a> {
    preamble: Option<&'a str>,
    history: Vec<&'a Turn>,
    prompt: &'a str,
}

/// Split `turns` into preamble, history, and the final user prompt.
///
/// Only the first turn may be a system turn, and the last turn must be a
/// user turn.
fn split_transcript(turns: &[Turn]) -> Result<SplitTranscript<'_>, ProviderError> {
    let (preamble, rest) = match turns.split_first() {
        Some((first, rest)) if first.role == Role::System => (Some(first.content.as_str()), rest),
        _ => (None, turns),
    };

    let Some((last, history)) = rest.split_last() else {
        return Err(ProviderError::InvalidTranscript(
            "transcript has no user prompt".to_string(),
        ));
    };
    if last.role != Role::User {
        return Err(ProviderError::InvalidTranscript(format!(
            "last turn must be from the user, got {}",
            last.role
        )));
    }
    if history.iter().any(|t| t.role == Role::System) {
        return Err(ProviderError::InvalidTranscript(
            "system turn is only allowed first".to_string(),
        ));
    }

    Ok(SplitTranscript {
        preamble,
        history: history.iter().collect(),
        prompt: &last.content,
    })
}

/// rig's OpenAI adapter reports a response with zero choices this way.
const NO_CHOICES: &str = "Response contained no choices";

/// rig's OpenAI adapter reports a choice whose content is empty this way.
const EMPTY_CONTENT: &str = "Response contained no message or tool call (empty)";

/// Map a failed prompt onto the provider error, recovering the one case
/// that is a valid answer: a choice with empty content.
fn recover_reply(err: PromptError, label: &str) -> Result<String, ProviderError> {
    match &err {
        PromptError::CompletionError(CompletionError::ResponseError(msg)) if msg == NO_CHOICES => {
            Err(ProviderError::EmptyResponse)
        }
        PromptError::CompletionError(CompletionError::ResponseError(msg))
            if msg == EMPTY_CONTENT =>
        {
            tracing::debug!("{label} returned an empty choice");
            Ok(String::new())
        }
        _ => Err(ProviderError::ApiError(format!("{label} error: {err}"))),
    }
}

fn to_rig_message(turn: &Turn) -> Message {
    match turn.role {
        Role::Assistant => Message::assistant(turn.content.clone()),
        Role::User | Role::System => Message::user(turn.content.clone()),
    }
}

/// rig-core based language model.
pub struct RigProvider {
    config: LlmConfig,
}

impl std::fmt::Debug for RigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigProvider")
            .field("config", &self.config)
            .finish()
    }
}

impl RigProvider {
    /// Create a new RigProvider with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_none() {
            return Err(ProviderError::NotConfigured(format!(
                "no API key found. Set {} or {}.",
                crate::constants::ENV_API_KEY,
                crate::constants::ENV_OPENAI_API_KEY
            )));
        }
        Ok(Self { config })
    }

    /// Get the API key or return an error.
    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("missing API key".to_string()))
    }

    /// Build an OpenAI-style client, optionally with a custom base URL.
    fn build_client(&self) -> Result<providers::openai::CompletionsClient, ProviderError> {
        let mut builder = providers::openai::CompletionsClient::builder().api_key(self.api_key()?);
        if let Some(ref base_url) = self.config.base_url {
            builder = builder.base_url(base_url);
        }
        builder
            .build()
            .map_err(|e| ProviderError::ApiError(format!("failed to create OpenAI client: {e}")))
    }

    /// Send the transcript and wrap the reply as a single assistant turn.
    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
        label: &str,
    ) -> Result<Completion, ProviderError> {
        let split = split_transcript(request.turns)?;
        let client = self.build_client()?;

        let mut builder = client.agent(request.model).max_tokens(request.max_output_tokens);
        if let Some(preamble) = split.preamble {
            builder = builder.preamble(preamble);
        }
        let agent = builder.build();

        let history: Vec<Message> = split.history.into_iter().map(to_rig_message).collect();
        tracing::debug!(
            model = request.model,
            history = history.len(),
            max_output_tokens = request.max_output_tokens,
            "{label} request"
        );

        let result = agent
            .prompt(Message::user(split.prompt))
            .with_history(history)
            .extended_details()
            .await;

        let reply = match result {
            Ok(response) => {
                tracing::info!(
                    total_tokens = response.usage.total_tokens,
                    prompt_tokens = response.usage.input_tokens,
                    completion_tokens = response.usage.output_tokens,
                    "{label} token usage"
                );
                response.output
            }
            Err(err) => recover_reply(err, label)?,
        };
        tracing::debug!(chars = reply.len(), "{label} response received");

        Ok(Completion {
            turns: vec![Turn::assistant(reply)],
        })
    }
}

#[async_trait]
impl LanguageModel for RigProvider {
    async fn summarize_changes(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<Completion, ProviderError> {
        self.complete(request, "change summary").await
    }

    async fn summarize_release_note(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<Completion, ProviderError> {
        self.complete(request, "release note").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: api_key.map(str::to_string),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn new_provider_missing_api_key() {
        match RigProvider::new(config(None)) {
            Err(e) => assert!(e.to_string().contains("API key"), "got: {e}"),
            Ok(_) => panic!("expected error for missing API key"),
        }
    }

    #[test]
    fn new_provider_with_api_key() {
        assert!(RigProvider::new(config(Some("sk-test-key"))).is_ok());
    }

    #[test]
    fn debug_output_hides_api_key() {
        let provider = RigProvider::new(config(Some("sk-secret"))).unwrap();
        assert!(!format!("{provider:?}").contains("sk-secret"));
    }

    #[test]
    fn split_first_request() {
        let turns = vec![Turn::system("be brief"), Turn::user("summarize")];
        let split = split_transcript(&turns).unwrap();
        assert_eq!(split.preamble, Some("be brief"));
        assert!(split.history.is_empty());
        assert_eq!(split.prompt, "summarize");
    }

    #[test]
    fn split_follow_up_request_keeps_history() {
        let turns = vec![
            Turn::system("be brief"),
            Turn::user("summarize"),
            Turn::assistant("summary"),
            Turn::user("release note"),
        ];
        let split = split_transcript(&turns).unwrap();
        assert_eq!(split.preamble, Some("be brief"));
        assert_eq!(split.history, vec![&turns[1], &turns[2]]);
        assert_eq!(split.prompt, "release note");
    }

    #[test]
    fn split_without_system_turn() {
        let turns = vec![Turn::user("hi")];
        let split = split_transcript(&turns).unwrap();
        assert_eq!(split.preamble, None);
        assert_eq!(split.prompt, "hi");
    }

    #[test]
    fn split_rejects_trailing_assistant_turn() {
        let turns = vec![Turn::system("s"), Turn::user("u"), Turn::assistant("a")];
        assert!(matches!(
            split_transcript(&turns),
            Err(ProviderError::InvalidTranscript(_))
        ));
    }

    #[test]
    fn split_rejects_system_only_transcript() {
        let turns = vec![Turn::system("s")];
        assert!(matches!(
            split_transcript(&turns),
            Err(ProviderError::InvalidTranscript(_))
        ));
    }

    #[test]
    fn split_rejects_late_system_turn() {
        let turns = vec![Turn::system("s"), Turn::system("again"), Turn::user("u")];
        assert!(split_transcript(&turns).is_err());
    }

    fn provider_for(server: &mockito::ServerGuard) -> RigProvider {
        RigProvider::new(LlmConfig {
            api_key: Some("sk-test".to_string()),
            base_url: Some(server.url()),
            ..LlmConfig::default()
        })
        .unwrap()
    }

    fn chat_completion(choices: serde_json::Value) -> String {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 0,
            "model": "gpt-4o-mini",
            "choices": choices,
            "usage": { "prompt_tokens": 12, "total_tokens": 20 }
        })
        .to_string()
    }

    fn assistant_choice(content: &str) -> serde_json::Value {
        serde_json::json!([{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "logprobs": null,
            "finish_reason": "stop"
        }])
    }

    async fn mock_completion(
        server: &mut mockito::ServerGuard,
        status: usize,
        body: String,
    ) -> mockito::Mock {
        server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({ "model": "gpt-4o-mini" }),
            ))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    fn first_request(turns: &[Turn]) -> CompletionRequest<'_> {
        CompletionRequest {
            model: "gpt-4o-mini",
            turns,
            max_output_tokens: 100,
        }
    }

    #[tokio::test]
    async fn reply_becomes_assistant_turn() {
        let mut server = mockito::Server::new_async().await;
        let mock = mock_completion(
            &mut server,
            200,
            chat_completion(assistant_choice("Adds login.")),
        )
        .await;
        let turns = vec![Turn::system("be brief"), Turn::user("summarize")];

        let completion = provider_for(&server)
            .summarize_changes(&first_request(&turns))
            .await
            .unwrap();

        assert_eq!(completion.turns, vec![Turn::assistant("Adds login.")]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn zero_choices_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_completion(&mut server, 200, chat_completion(serde_json::json!([]))).await;
        let turns = vec![Turn::system("be brief"), Turn::user("summarize")];

        let err = provider_for(&server)
            .summarize_changes(&first_request(&turns))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::EmptyResponse), "got: {err}");
    }

    #[tokio::test]
    async fn empty_content_is_still_a_reply() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_completion(&mut server, 200, chat_completion(assistant_choice(""))).await;
        let turns = vec![Turn::system("be brief"), Turn::user("release note")];

        let completion = provider_for(&server)
            .summarize_release_note(&first_request(&turns))
            .await
            .unwrap();

        assert_eq!(completion.turns, vec![Turn::assistant("")]);
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_completion(&mut server, 500, r#"{"error":"boom"}"#.to_string()).await;
        let turns = vec![Turn::system("be brief"), Turn::user("summarize")];

        let err = provider_for(&server)
            .summarize_changes(&first_request(&turns))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::ApiError(_)), "got: {err}");
    }

    #[test]
    fn other_response_errors_stay_api_errors() {
        let err = PromptError::CompletionError(CompletionError::ResponseError(
            "Response did not contain a valid message or tool call".to_string(),
        ));
        assert!(matches!(
            recover_reply(err, "change summary"),
            Err(ProviderError::ApiError(_))
        ));
    }
}
