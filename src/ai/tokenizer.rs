use std::path::Path;

use crate::error::{AppError, Result};

use super::Tokenizer;

/// HuggingFace tokenizer loaded from a `tokenizer.json`.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    sentinel_ids: Vec<u32>,
}

impl HfTokenizer {
    pub fn from_file(path: impl AsRef<Path>, sentinel_tokens: &[String]) -> Result<Self> {
        let path = path.as_ref();
        let mut inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| AppError::Tokenizer(format!("{}: {}", path.display(), e)))?;

        // Chunking needs the whole article, unpadded.
        inner
            .with_truncation(None)
            .map_err(|e| AppError::Tokenizer(e.to_string()))?;
        inner.with_padding(None);

        let sentinel_ids = sentinel_tokens
            .iter()
            .filter_map(|token| {
                let id = inner.token_to_id(token);
                if id.is_none() {
                    tracing::debug!("Sentinel token {} not in vocabulary", token);
                }
                id
            })
            .collect();

        Ok(Self {
            inner,
            sentinel_ids,
        })
    }
}

impl Tokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| AppError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner
            .decode(ids, true)
            .map_err(|e| AppError::Tokenizer(e.to_string()))
    }

    fn sentinel_ids(&self) -> &[u32] {
        &self.sentinel_ids
    }
}
