use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::SheetsConfig;
use crate::error::{AppError, Result};

use super::SheetExporter;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Serialize)]
struct AppendRequest<'a> {
    values: &'a [Vec<String>],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_cells: u64,
}

pub struct SheetsClient {
    client: Client,
    api_url: String,
    spreadsheet_id: String,
    range: String,
    access_token: String,
}

impl SheetsClient {
    pub fn new(config: &SheetsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            api_url: SHEETS_API_URL.to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            range: config.range.clone(),
            access_token: config.access_token.clone(),
        })
    }

    #[cfg(test)]
    fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    fn append_url(&self) -> String {
        format!(
            "{}/{}/values/{}:append",
            self.api_url,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(&self.range)
        )
    }
}

#[async_trait]
impl SheetExporter for SheetsClient {
    /// Append rows after the last filled row of the configured range.
    async fn append(&self, rows: &[Vec<String>]) -> Result<u64> {
        let response = self
            .client
            .post(self.append_url())
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.access_token)
            .json(&AppendRequest { values: rows })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                return Err(AppError::Unreachable(format!("Sheets returned {}", status)));
            }
            return Err(AppError::SheetsApi(format!("API error: {}", error_text)));
        }

        let append: AppendResponse = response.json().await?;
        Ok(append.updates.map(|u| u.updated_cells).unwrap_or(0))
    }
}
