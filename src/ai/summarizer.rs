use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::chunker;

/// Decoding parameters forwarded to the model on every generate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub num_beams: u32,
    pub length_penalty: f32,
    pub min_length: u32,
    pub no_repeat_ngram_size: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            num_beams: 4,
            length_penalty: 2.0,
            min_length: 25,
            no_repeat_ngram_size: 3,
        }
    }
}

pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// Decodes to text, dropping special tokens.
    fn decode(&self, ids: &[u32]) -> Result<String>;

    /// Padding and sentinel ids that carry no article content.
    fn sentinel_ids(&self) -> &[u32];
}

#[async_trait]
pub trait SummaryModel: Send + Sync {
    fn model_id(&self) -> &str;

    /// Largest token sequence accepted per input.
    fn max_input_length(&self) -> usize;

    /// Generates one output sequence per input, in input order.
    async fn generate(&self, batch: &[&[u32]], params: &GenerationParams) -> Result<Vec<Vec<u32>>>;
}

/// Anything that can turn article text into a summary.
#[async_trait]
pub trait TextSummarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

pub struct Summarizer {
    tokenizer: Box<dyn Tokenizer>,
    model: Box<dyn SummaryModel>,
    params: GenerationParams,
}

impl Summarizer {
    pub fn new(
        tokenizer: Box<dyn Tokenizer>,
        model: Box<dyn SummaryModel>,
        params: GenerationParams,
    ) -> Self {
        Self {
            tokenizer,
            model,
            params,
        }
    }

    pub fn model_version(&self) -> &str {
        self.model.model_id()
    }

    fn encode_content(&self, text: &str) -> Result<Vec<u32>> {
        let sentinels = self.tokenizer.sentinel_ids();
        let mut ids = self.tokenizer.encode(text)?;
        ids.retain(|id| !sentinels.contains(id));
        Ok(ids)
    }

    async fn generate_texts(&self, batch: &[&[u32]]) -> Result<Vec<String>> {
        let outputs = self.model.generate(batch, &self.params).await?;
        if outputs.len() != batch.len() {
            return Err(AppError::Model(format!(
                "expected {} sequences, model returned {}",
                batch.len(),
                outputs.len()
            )));
        }

        outputs
            .iter()
            .map(|ids| self.tokenizer.decode(ids))
            .collect()
    }
}

#[async_trait]
impl TextSummarizer for Summarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let ids = self.encode_content(text)?;
        let Some(chunks) = chunker::split(&ids, self.model.max_input_length()) else {
            tracing::debug!("No content tokens left after encoding");
            return Ok(String::new());
        };

        tracing::debug!(
            "Summarizing {} tokens in {} chunks with {}",
            ids.len(),
            chunks.count(),
            self.model.model_id()
        );

        let mut summary = String::new();

        for piece in self.generate_texts(&chunks.full).await? {
            summary.push_str(&piece);
            summary.push(' ');
        }

        if let Some(remainder) = chunks.remainder {
            for piece in self.generate_texts(&[remainder]).await? {
                summary.push_str(&piece);
            }
        }

        Ok(summary.trim().to_string())
    }
}
