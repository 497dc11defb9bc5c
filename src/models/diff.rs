//! Changed-file entries of a merge request.

use serde::{Deserialize, Serialize};

/// One file's patch within a merge request.
///
/// Serialized as-is into the change-summary prompt, so field order and
/// names are part of what the model sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Unified diff text for this file.
    pub diff: String,
    pub new_path: String,
    pub old_path: String,
    pub is_new: bool,
    pub is_renamed: bool,
    pub is_deleted: bool,
}

impl ChangedFile {
    /// A modification of `path` with the given patch text.
    pub fn modified(path: &str, diff: &str) -> Self {
        Self {
            diff: diff.to_string(),
            new_path: path.to_string(),
            old_path: path.to_string(),
            is_new: false,
            is_renamed: false,
            is_deleted: false,
        }
    }
}
