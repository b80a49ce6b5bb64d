use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::PocketConfig;
use crate::error::{AppError, Result};
use crate::models::SourceFields;

use super::{ArticleSource, FetchWindow};

const POCKET_API_URL: &str = "https://getpocket.com/v3/get";

#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    list: ItemList,
}

/// Pocket returns `"list": []` instead of an object when nothing matched.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemList {
    Items(BTreeMap<String, PocketItem>),
    #[allow(dead_code)]
    Empty(Vec<serde_json::Value>),
}

impl Default for ItemList {
    fn default() -> Self {
        ItemList::Empty(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct PocketItem {
    item_id: String,
    resolved_url: Option<String>,
    resolved_title: Option<String>,
    time_added: Option<String>,
    word_count: Option<String>,
    excerpt: Option<String>,
}

impl PocketItem {
    fn into_entry(self) -> (String, SourceFields) {
        (
            self.item_id,
            SourceFields {
                resolved_url: self.resolved_url,
                resolved_title: self.resolved_title,
                time_added: self.time_added,
                word_count: self.word_count,
                excerpt: self.excerpt,
            },
        )
    }
}

pub struct PocketClient {
    client: Client,
    api_url: String,
    consumer_key: String,
    access_token: String,
}

impl PocketClient {
    pub fn new(config: &PocketConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_url: POCKET_API_URL.to_string(),
            consumer_key: config.consumer_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    #[cfg(test)]
    fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }
}

#[async_trait]
impl ArticleSource for PocketClient {
    async fn fetch(&self, window: FetchWindow) -> Result<BTreeMap<String, SourceFields>> {
        let request = RetrieveRequest {
            consumer_key: &self.consumer_key,
            access_token: &self.access_token,
            since: window.since_unix(),
        };

        let response = self
            .client
            .get(self.api_url.as_str())
            .query(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                return Err(AppError::Unreachable(format!("Pocket returned {}", status)));
            }
            return Err(AppError::PocketApi(format!("API error: {}", error_text)));
        }

        let body: RetrieveResponse = response.json().await?;
        Ok(collect_items(body.list))
    }
}

fn collect_items(list: ItemList) -> BTreeMap<String, SourceFields> {
    match list {
        ItemList::Items(items) => items.into_values().map(PocketItem::into_entry).collect(),
        ItemList::Empty(_) => BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve_once;

    async fn fetch_against(status: &str, body: &str) -> Result<BTreeMap<String, SourceFields>> {
        let base = serve_once(status, body).await;
        let client = PocketClient::new(&PocketConfig {
            consumer_key: "key".to_string(),
            access_token: "token".to_string(),
        })
        .unwrap()
        .with_api_url(format!("{}/v3/get", base));
        client.fetch(FetchWindow::All).await
    }

    fn parse(json: &str) -> BTreeMap<String, SourceFields> {
        let body: RetrieveResponse = serde_json::from_str(json).unwrap();
        collect_items(body.list)
    }

    #[test]
    fn items_are_keyed_by_item_id() {
        let articles = parse(
            r#"{
                "status": 1,
                "list": {
                    "229279689": {
                        "item_id": "229279689",
                        "resolved_url": "http://example.com/a",
                        "resolved_title": "A title",
                        "time_added": "1592600000",
                        "word_count": "3197",
                        "excerpt": "Intro",
                        "favorite": "0"
                    }
                }
            }"#,
        );

        let fields = &articles["229279689"];
        assert_eq!(fields.resolved_url.as_deref(), Some("http://example.com/a"));
        assert_eq!(fields.word_count.as_deref(), Some("3197"));
        assert_eq!(fields.time_added.as_deref(), Some("1592600000"));
    }

    #[test]
    fn empty_list_is_an_array() {
        assert!(parse(r#"{"status": 2, "list": []}"#).is_empty());
        assert!(parse(r#"{"status": 2}"#).is_empty());
    }

    #[test]
    fn since_is_omitted_for_full_history() {
        let request = RetrieveRequest {
            consumer_key: "key",
            access_token: "token",
            since: FetchWindow::All.since_unix(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("since").is_none());
    }

    #[tokio::test]
    async fn server_errors_are_unreachable() {
        let err = fetch_against("503 Service Unavailable", "").await.unwrap_err();

        assert!(matches!(err, AppError::Unreachable(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn rejected_credentials_are_not_recoverable() {
        let err = fetch_against("401 Unauthorized", "").await.unwrap_err();

        assert!(matches!(err, AppError::PocketApi(_)));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn empty_result_is_an_empty_map() {
        let articles = fetch_against("200 OK", r#"{"status": 2, "list": []}"#).await.unwrap();
        assert!(articles.is_empty());
    }
}
