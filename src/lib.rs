//! mr-reviewer: LLM-generated merge request summaries (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod config;
pub mod constants;
pub mod env;
pub mod filter;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod providers;
pub mod scm;
pub mod tokens;
