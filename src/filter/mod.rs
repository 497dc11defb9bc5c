//! Path-exclusion filtering for changed files.
//!
//! Patterns are unanchored regular expressions matched against each file's
//! new path. Compiled once per run and shared read-only.

use regex::Regex;
use thiserror::Error;

use crate::models::ChangedFile;

/// Errors from compiling path filters.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid path filter '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Ordered set of compiled exclusion patterns.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    patterns: Vec<Regex>,
}

impl PathFilter {
    /// Compile `patterns` in order. The first invalid pattern aborts construction.
    pub fn new(patterns: &[String]) -> Result<Self, FilterError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|source| FilterError::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `path` matches any pattern.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }

    /// Split `files` into the ones to keep (original order) and a removed count.
    pub fn filter(&self, files: Vec<ChangedFile>) -> (Vec<ChangedFile>, usize) {
        if self.is_empty() {
            return (files, 0);
        }
        let total = files.len();
        let kept: Vec<ChangedFile> = files
            .into_iter()
            .filter(|f| !self.is_excluded(&f.new_path))
            .collect();
        let removed = total - kept.len();
        (kept, removed)
    }
}
