//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. The config file (`--config`, `MR_REVIEWER_CONFIG`, or `config/config.toml`)
//! 4. `~/.config/mr-reviewer/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::constants;
use crate::env::Env;
use crate::models::SupportedModel;

/// Log levels accepted by `log_level`.
pub const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

const DEFAULT_SYSTEM_MESSAGE: &str = "You are an experienced software engineer reviewing a \
GitLab merge request. Be accurate and concise, and only describe what the diff shows.";

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub release_mode: bool,
    pub gitlab: GitlabConfig,
    pub llm: LlmConfig,
    pub review: ReviewConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            release_mode: false,
            gitlab: GitlabConfig::default(),
            llm: LlmConfig::default(),
            review: ReviewConfig::default(),
        }
    }
}

/// GitLab connection and target merge request.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitlabConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub project_id: Option<u64>,
    pub merge_request_id: Option<u64>,
    /// Regular expressions; changed files whose new path matches are not reviewed.
    pub path_filters: Vec<String>,
}

impl std::fmt::Debug for GitlabConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitlabConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("project_id", &self.project_id)
            .field("merge_request_id", &self.merge_request_id)
            .field("path_filters", &self.path_filters)
            .finish()
    }
}

/// Language-model backend configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub system_message: String,
    /// Per-message input ceiling. Non-positive means the built-in default.
    pub max_input_tokens: i64,
    pub max_output_tokens: i64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("system_message", &self.system_message)
            .field("max_input_tokens", &self.max_input_tokens)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: SupportedModel::default().as_str().to_string(),
            system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
            max_input_tokens: 10_000,
            max_output_tokens: 10_000,
        }
    }
}

/// Run deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Deadline for the whole run, in seconds.
    pub timeout_secs: u64,
    /// Deadline for each language-model call, in seconds.
    pub llm_timeout_secs: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            llm_timeout_secs: 180,
        }
    }
}

impl ReviewConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

/// Values supplied on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub gitlab_url: Option<String>,
    pub gitlab_token: Option<String>,
    pub project_id: Option<u64>,
    pub merge_request_id: Option<u64>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_input_tokens: Option<i64>,
    pub max_output_tokens: Option<i64>,
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// `path` is the explicitly requested config file; it must exist. When
    /// `None`, `MR_REVIEWER_CONFIG` is consulted, then the default
    /// `config/config.toml`, which is skipped silently if absent.
    pub fn load(path: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 4: global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        // Layer 3: config file
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env.var(constants::ENV_CONFIG).map(PathBuf::from));
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path));
                }
                config.merge(Self::load_file(&path)?);
            }
            None => {
                let default_path = Path::new(constants::DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    config.merge(Self::load_file(default_path)?);
                }
            }
        }

        // Layer 2: environment variables
        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    fn merge(&mut self, other: Config) {
        let defaults = Config::default();

        if other.log_level != defaults.log_level {
            self.log_level = other.log_level;
        }
        if other.release_mode {
            self.release_mode = true;
        }

        // GitLab settings
        if other.gitlab.url.is_some() {
            self.gitlab.url = other.gitlab.url;
        }
        if other.gitlab.token.is_some() {
            self.gitlab.token = other.gitlab.token;
        }
        if other.gitlab.project_id.is_some() {
            self.gitlab.project_id = other.gitlab.project_id;
        }
        if other.gitlab.merge_request_id.is_some() {
            self.gitlab.merge_request_id = other.gitlab.merge_request_id;
        }
        if !other.gitlab.path_filters.is_empty() {
            self.gitlab.path_filters = other.gitlab.path_filters;
        }

        // LLM settings
        if other.llm.api_key.is_some() {
            self.llm.api_key = other.llm.api_key;
        }
        if other.llm.base_url.is_some() {
            self.llm.base_url = other.llm.base_url;
        }
        if other.llm.model != defaults.llm.model {
            self.llm.model = other.llm.model;
        }
        if other.llm.system_message != defaults.llm.system_message {
            self.llm.system_message = other.llm.system_message;
        }
        if other.llm.max_input_tokens != defaults.llm.max_input_tokens {
            self.llm.max_input_tokens = other.llm.max_input_tokens;
        }
        if other.llm.max_output_tokens != defaults.llm.max_output_tokens {
            self.llm.max_output_tokens = other.llm.max_output_tokens;
        }

        // Deadlines
        if other.review.timeout_secs != defaults.review.timeout_secs {
            self.review.timeout_secs = other.review.timeout_secs;
        }
        if other.review.llm_timeout_secs != defaults.review.llm_timeout_secs {
            self.review.llm_timeout_secs = other.review.llm_timeout_secs;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(val) = env.var(constants::ENV_LOG_LEVEL) {
            self.log_level = val;
        }
        match env.flag(constants::ENV_RELEASE_MODE) {
            Ok(Some(on)) => self.release_mode = on,
            Ok(None) => {}
            Err(val) => eprintln!(
                "Warning: ignoring invalid {} value: {val}",
                constants::ENV_RELEASE_MODE
            ),
        }

        if let Some(val) = env.var(constants::ENV_GITLAB_URL) {
            self.gitlab.url = Some(val);
        }
        if let Some(val) = env.var(constants::ENV_GITLAB_TOKEN) {
            self.gitlab.token = Some(val);
        }
        if let Some(id) = parse_id(env, constants::ENV_GITLAB_PROJECT_ID) {
            self.gitlab.project_id = Some(id);
        }
        if let Some(id) = parse_id(env, constants::ENV_GITLAB_MERGE_REQUEST_ID) {
            self.gitlab.merge_request_id = Some(id);
        }

        if let Some(val) = env.var(constants::ENV_MODEL) {
            self.llm.model = val;
        }
        if let Some(val) = env.var(constants::ENV_BASE_URL) {
            self.llm.base_url = Some(val);
        }

        // The tool-specific key wins over the generic OpenAI one
        let api_key = env
            .var(constants::ENV_API_KEY)
            .or_else(|| env.var(constants::ENV_OPENAI_API_KEY));
        if api_key.is_some() {
            self.llm.api_key = api_key;
        }
    }

    /// Apply command-line overrides (highest priority).
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(ref level) = overrides.log_level {
            self.log_level = level.clone();
        }
        if let Some(ref url) = overrides.gitlab_url {
            self.gitlab.url = Some(url.clone());
        }
        if let Some(ref token) = overrides.gitlab_token {
            self.gitlab.token = Some(token.clone());
        }
        if overrides.project_id.is_some() {
            self.gitlab.project_id = overrides.project_id;
        }
        if overrides.merge_request_id.is_some() {
            self.gitlab.merge_request_id = overrides.merge_request_id;
        }
        if let Some(ref key) = overrides.api_key {
            self.llm.api_key = Some(key.clone());
        }
        if let Some(ref model) = overrides.model {
            self.llm.model = model.clone();
        }
        if let Some(n) = overrides.max_input_tokens {
            self.llm.max_input_tokens = n;
        }
        if let Some(n) = overrides.max_output_tokens {
            self.llm.max_output_tokens = n;
        }
    }

    /// Check that everything a run needs is present and well-formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            problems.push(format!(
                "log_level '{}' must be one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }
        if self.gitlab.url.is_none() {
            problems.push(format!("GitLab URL is required (set {})", constants::ENV_GITLAB_URL));
        }
        if self.gitlab.token.is_none() {
            problems.push(format!(
                "GitLab token is required (set {})",
                constants::ENV_GITLAB_TOKEN
            ));
        }
        if self.llm.api_key.is_none() {
            problems.push(format!(
                "LLM API key is required (set {} or {})",
                constants::ENV_API_KEY,
                constants::ENV_OPENAI_API_KEY
            ));
        }
        if self.llm.system_message.trim().is_empty() {
            problems.push("llm.system_message must not be empty".to_string());
        }
        if let Err(e) = self.llm.model.parse::<SupportedModel>() {
            problems.push(e);
        }
        if self.review.timeout_secs == 0 || self.review.llm_timeout_secs == 0 {
            problems.push("review timeouts must be positive".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }
}

fn parse_id(env: &Env, name: &str) -> Option<u64> {
    let val = env.var(name)?;
    match val.trim().parse::<u64>() {
        Ok(id) => Some(id),
        Err(_) => {
            eprintln!("Warning: ignoring invalid {name} value: {val}");
            None
        }
    }
}
