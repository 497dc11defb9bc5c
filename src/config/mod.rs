//! Configuration loading and layering.
//!
//! Handles TOML config file loading, environment variable resolution,
//! and CLI flag merging with proper priority ordering.

pub mod loader;

pub use loader::{Config, ConfigError, GitlabConfig, LlmConfig, Overrides, ReviewConfig};
