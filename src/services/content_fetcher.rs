use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};

use super::ContentExtractor;

const USER_AGENT_STRING: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

// Wide enough that html2text does not hard-wrap paragraphs.
const TEXT_WIDTH: usize = 4096;

pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentExtractor for ContentFetcher {
    /// Fetch the page and convert it to plain text.
    async fn extract(&self, article_url: &str) -> Result<String> {
        let url = Url::parse(article_url)
            .map_err(|e| AppError::Unreachable(format!("invalid url {}: {}", article_url, e)))?;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Unreachable(format!(
                "{} returned {}",
                article_url,
                response.status()
            )));
        }

        let html = response.text().await?;
        html_to_text(&html)
    }
}

fn html_to_text(html: &str) -> Result<String> {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .map_err(|e| AppError::Other(anyhow::anyhow!("Failed to convert HTML to text: {}", e)))
}
