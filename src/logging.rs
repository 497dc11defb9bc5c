//! Tracing subscriber setup.
//!
//! Development mode logs compact human-readable lines to stderr. Release
//! mode switches to JSON without ANSI colors for log collectors.

use tracing_subscriber::EnvFilter;

use crate::config::loader::LOG_LEVELS;

const FALLBACK_LEVEL: &str = "info";

/// Map a configured level onto a known one. Returns `None` when it was invalid.
fn resolve_level(level: &str) -> Option<&'static str> {
    let level = level.trim().to_lowercase();
    LOG_LEVELS.iter().copied().find(|l| *l == level)
}

/// Our crate logs at `level`; dependencies only at `warn` and above.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("warn,mr_reviewer={level}"))
}

/// Install the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init(level: &str, release_mode: bool) {
    let resolved = resolve_level(level);
    let filter = build_filter(resolved.unwrap_or(FALLBACK_LEVEL));

    let result = if release_mode {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true)
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .compact()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
    };

    if result.is_ok() && resolved.is_none() {
        tracing::warn!(configured = level, "unknown log level, falling back to {FALLBACK_LEVEL}");
    }
}
