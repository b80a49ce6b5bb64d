use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::SummarizerConfig;
use crate::error::{AppError, Result};

use super::{GenerationParams, SummaryModel};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    input_ids: &'a [&'a [u32]],
    parameters: &'a GenerationParams,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    sequences: Vec<Vec<u32>>,
}

/// Sequence-to-sequence model served over HTTP. Token ids go in, token ids
/// come out.
pub struct RemoteModel {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
    model_id: String,
    max_input_length: usize,
}

impl RemoteModel {
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        if config.max_input_length == 0 {
            return Err(AppError::Config(
                "summarizer.max_input_length must be at least 1".to_string(),
            ));
        }

        // Beam search over a full window is slow.
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
            model_id: config.model_id.clone(),
            max_input_length: config.max_input_length,
        })
    }
}

#[async_trait]
impl SummaryModel for RemoteModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn max_input_length(&self) -> usize {
        self.max_input_length
    }

    async fn generate(&self, batch: &[&[u32]], params: &GenerationParams) -> Result<Vec<Vec<u32>>> {
        let request = GenerateRequest {
            model: &self.model_id,
            input_ids: batch,
            parameters: params,
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                return Err(AppError::Unreachable(format!(
                    "{} returned {}: {}",
                    self.endpoint, status, error_text
                )));
            }
            return Err(AppError::Model(format!("API error: {}", error_text)));
        }

        let response: GenerateResponse = response.json().await?;
        Ok(response.sequences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve_once;

    fn config(max_input_length: usize) -> SummarizerConfig {
        with_endpoint("http://localhost:8080/generate", max_input_length)
    }

    fn with_endpoint(endpoint: &str, max_input_length: usize) -> SummarizerConfig {
        SummarizerConfig {
            tokenizer_path: "tokenizer.json".to_string(),
            endpoint: endpoint.to_string(),
            api_token: None,
            model_id: "facebook/bart-large-cnn".to_string(),
            max_input_length,
            sentinel_tokens: Vec::new(),
            generation: GenerationParams::default(),
        }
    }

    #[test]
    fn request_carries_batch_and_decoding_parameters() {
        let chunks: [&[u32]; 2] = [&[1, 2], &[3]];
        let params = GenerationParams::default();
        let request = GenerateRequest {
            model: "m",
            input_ids: &chunks,
            parameters: &params,
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "input_ids": [[1, 2], [3]],
                "parameters": {
                    "num_beams": 4,
                    "length_penalty": 2.0,
                    "min_length": 25,
                    "no_repeat_ngram_size": 3
                }
            })
        );
    }

    #[test]
    fn response_parses_sequences() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"sequences": [[0, 5, 2], [0, 7, 2]]}"#).unwrap();
        assert_eq!(response.sequences, vec![vec![0, 5, 2], vec![0, 7, 2]]);
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(matches!(RemoteModel::new(&config(0)), Err(AppError::Config(_))));

        let model = RemoteModel::new(&config(1024)).unwrap();
        assert_eq!(model.max_input_length(), 1024);
        assert_eq!(model.model_id(), "facebook/bart-large-cnn");
    }

    async fn generate_against(status: &str, body: &str) -> Result<Vec<Vec<u32>>> {
        let base = serve_once(status, body).await;
        let model = RemoteModel::new(&with_endpoint(&format!("{}/generate", base), 16)).unwrap();
        let chunks: [&[u32]; 1] = [&[5, 6, 7]];
        model.generate(&chunks, &GenerationParams::default()).await
    }

    #[tokio::test]
    async fn overload_and_server_errors_are_unreachable() {
        for status in ["503 Service Unavailable", "429 Too Many Requests"] {
            let err = generate_against(status, r#"{"error": "busy"}"#).await.unwrap_err();
            assert!(matches!(err, AppError::Unreachable(_)), "{}: {:?}", status, err);
            assert!(err.is_recoverable());
        }
    }

    #[tokio::test]
    async fn client_errors_are_not_recoverable() {
        let err = generate_against("400 Bad Request", r#"{"error": "bad input"}"#)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Model(_)));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn success_returns_sequences() {
        let sequences = generate_against("200 OK", r#"{"sequences": [[0, 9, 2]]}"#)
            .await
            .unwrap();

        assert_eq!(sequences, vec![vec![0, 9, 2]]);
    }
}
