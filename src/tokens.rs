//! BPE token counting for prompt budgeting.

use std::fmt;

use tiktoken_rs::CoreBPE;

/// Counts tokens the way the target model's tokenizer would.
pub struct TokenCounter {
    model: String,
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Load the tokenizer for `model`.
    pub fn for_model(model: &str) -> Result<Self, String> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .map_err(|e| format!("no tokenizer for model '{model}': {e}"))?;
        Ok(Self {
            model: model.to_string(),
            bpe,
        })
    }

    /// Number of tokens in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

impl fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCounter")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
