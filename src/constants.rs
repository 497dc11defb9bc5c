//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! and the fixed comment markers so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "mr-reviewer";

/// Crate version, as reported by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Directory name under `~/.config/` for the global config.
pub const CONFIG_DIR: &str = "mr-reviewer";

/// Literal token in a merge request description that opts it out of review.
pub const IGNORE_MARKER: &str = "@codeReview: ignore";

/// First line of every published review comment.
pub const BOT_IDENTITY: &str = ":robot: CodeReviewerBot";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_CONFIG: &str = "MR_REVIEWER_CONFIG";
pub const ENV_LOG_LEVEL: &str = "MR_REVIEWER_LOG_LEVEL";
pub const ENV_RELEASE_MODE: &str = "MR_REVIEWER_RELEASE_MODE";
pub const ENV_MODEL: &str = "MR_REVIEWER_MODEL";
pub const ENV_API_KEY: &str = "MR_REVIEWER_API_KEY";
pub const ENV_BASE_URL: &str = "MR_REVIEWER_BASE_URL";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_GITLAB_URL: &str = "GITLAB_URL";
pub const ENV_GITLAB_TOKEN: &str = "GITLAB_TOKEN";
pub const ENV_GITLAB_PROJECT_ID: &str = "GITLAB_PROJECT_ID";
pub const ENV_GITLAB_MERGE_REQUEST_ID: &str = "GITLAB_MERGE_REQUEST_ID";
