//! mr-reviewer: LLM-generated merge request summaries for GitLab.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use mr_reviewer::config;
use mr_reviewer::env;
use mr_reviewer::logging;
use mr_reviewer::models;
use mr_reviewer::orchestrator;
use mr_reviewer::providers;
use mr_reviewer::scm;

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use cli::args::Cli;
use config::{Config, ConfigError};
use env::Env;
use models::{ReviewInput, ValidationError};
use orchestrator::{ReviewError, ReviewOrchestrator, ReviewSettings, ReviewStage};
use providers::rig::RigProvider;
use scm::GitlabClient;

/// Exit status for configuration and input problems.
const EXIT_USAGE: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let always_exit_zero = cli.always_exit_zero;

    if let Err(err) = run(cli).await {
        log_failure(&err);
        eprintln!("Error: {err:#}");
        if always_exit_zero {
            cli::print_usage();
            return;
        }
        process::exit(exit_code(&err));
    }
}

/// Stage the run failed in, when the failure came from the pipeline.
fn failure_stage(err: &anyhow::Error) -> Option<ReviewStage> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ReviewError>())
        .and_then(ReviewError::stage)
}

fn log_failure(err: &anyhow::Error) {
    match failure_stage(err) {
        Some(stage) => tracing::error!(%stage, error = %format!("{err:#}"), "review failed"),
        None => tracing::error!(error = %format!("{err:#}"), "review failed"),
    }
}

/// 2 for configuration or input errors, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> i32 {
    let is_usage = err.chain().any(|cause| {
        cause.downcast_ref::<ConfigError>().is_some()
            || cause.downcast_ref::<ValidationError>().is_some()
            || cause
                .downcast_ref::<ReviewError>()
                .is_some_and(|e| e.is_config() || e.is_validation())
    });
    if is_usage { EXIT_USAGE } else { 1 }
}

async fn run(cli: Cli) -> Result<()> {
    // Load config with layering, then let CLI flags win
    let mut config =
        Config::load(cli.config.as_deref(), &Env::real()).context("failed to load configuration")?;
    config.apply_overrides(&cli.overrides());

    logging::init(&config.log_level, config.release_mode);
    tracing::debug!(?config, "configuration loaded");
    config.validate()?;

    let input = ReviewInput::new(
        config.gitlab.project_id.unwrap_or_default(),
        config.gitlab.merge_request_id.unwrap_or_default(),
    );
    input.validate()?;

    let scm = Arc::new(GitlabClient::new(&config.gitlab).context("failed to set up GitLab client")?);
    let llm = Arc::new(
        RigProvider::new(config.llm.clone()).context("failed to set up language model")?,
    );

    let orchestrator = ReviewOrchestrator::new(scm, llm, ReviewSettings::from_config(&config))?;
    let outcome = orchestrator
        .run_with_deadline(input, config.review.timeout())
        .await
        .context("review failed")?;

    print!("{}", cli.format.render(&outcome));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_with_usage_code() {
        let err = anyhow::Error::new(ConfigError::Invalid("missing token".into()))
            .context("failed to load configuration");
        assert_eq!(exit_code(&err), EXIT_USAGE);
    }

    #[test]
    fn validation_errors_exit_with_usage_code() {
        let err = anyhow::Error::new(ValidationError::MergeRequestId);
        assert_eq!(exit_code(&err), EXIT_USAGE);

        let err = anyhow::Error::new(ReviewError::Validation(ValidationError::ProjectId))
            .context("review failed");
        assert_eq!(exit_code(&err), EXIT_USAGE);
    }

    #[test]
    fn failure_stage_is_found_through_context() {
        let err = anyhow::Error::new(ReviewError::Timeout {
            stage: ReviewStage::SummarizeReleaseNote,
            after: std::time::Duration::from_secs(180),
        })
        .context("review failed");
        assert_eq!(failure_stage(&err), Some(ReviewStage::SummarizeReleaseNote));
    }

    #[test]
    fn failure_stage_is_absent_outside_the_pipeline() {
        let err = anyhow::Error::new(ConfigError::Invalid("missing token".into()));
        assert_eq!(failure_stage(&err), None);

        let err = anyhow::Error::new(ReviewError::DeadlineExceeded(
            std::time::Duration::from_secs(60),
        ));
        assert_eq!(failure_stage(&err), None);
    }

    #[test]
    fn runtime_errors_exit_with_one() {
        let err = anyhow::Error::new(ReviewError::DeadlineExceeded(
            std::time::Duration::from_secs(60),
        ))
        .context("review failed");
        assert_eq!(exit_code(&err), 1);
    }
}
