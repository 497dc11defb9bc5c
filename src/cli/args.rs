//! Clap argument types and their mapping onto config overrides.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use mr_reviewer::config::Overrides;
use mr_reviewer::constants;
use mr_reviewer::models::RunOutcome;

/// Generate a change summary and release note for a GitLab merge request
/// and post them as a comment.
#[derive(Parser, Debug)]
#[command(name = constants::APP_NAME, version = constants::VERSION, about)]
pub struct Cli {
    /// Config file (TOML). Defaults to config/config.toml when present.
    #[arg(long, env = constants::ENV_CONFIG, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// GitLab project ID [env: GITLAB_PROJECT_ID]
    #[arg(long, value_name = "ID")]
    pub project: Option<u64>,

    /// GitLab merge request IID [env: GITLAB_MERGE_REQUEST_ID]
    #[arg(long, value_name = "IID")]
    pub merge_request: Option<u64>,

    /// GitLab base URL [env: GITLAB_URL]
    #[arg(long)]
    pub gitlab_url: Option<String>,

    /// GitLab access token [env: GITLAB_TOKEN]
    #[arg(long)]
    pub gitlab_token: Option<String>,

    /// Language-model API key [env: MR_REVIEWER_API_KEY, OPENAI_API_KEY]
    #[arg(long, alias = "openai-token")]
    pub api_key: Option<String>,

    /// Model to use (gpt-4o, gpt-4o-mini) [env: MR_REVIEWER_MODEL]
    #[arg(long)]
    pub model: Option<String>,

    /// Per-message input token ceiling; zero or negative means the default.
    #[arg(long, allow_negative_numbers = true)]
    pub max_input_tokens: Option<i64>,

    /// Completion token ceiling; zero or negative means the default.
    #[arg(long, allow_negative_numbers = true)]
    pub max_output_tokens: Option<i64>,

    /// Log level: debug, info, warn, error [env: MR_REVIEWER_LOG_LEVEL]
    #[arg(long = "log", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Output format for the local report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub format: OutputFormat,

    /// Always exit 0; on failure print the error and usage instead.
    #[arg(long, default_value_t = false)]
    pub always_exit_zero: bool,
}

impl Cli {
    /// Flags that override config and environment values.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            log_level: self.log_level.clone(),
            gitlab_url: self.gitlab_url.clone(),
            gitlab_token: self.gitlab_token.clone(),
            project_id: self.project,
            merge_request_id: self.merge_request,
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            max_input_tokens: self.max_input_tokens,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
}

impl OutputFormat {
    /// Render the outcome using the renderer for this format.
    pub fn render(&self, outcome: &RunOutcome) -> String {
        use mr_reviewer::output::OutputRenderer;
        match self {
            OutputFormat::Terminal => mr_reviewer::output::terminal::TerminalRenderer.render(outcome),
            OutputFormat::Json => mr_reviewer::output::json::JsonRenderer.render(outcome),
        }
    }
}
