mod content_fetcher;
mod pocket;
mod sheets;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::SourceFields;

pub use content_fetcher::ContentFetcher;
pub use pocket::PocketClient;
pub use sheets::SheetsClient;

/// Lower bound on when an article was saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchWindow {
    All,
    Since(DateTime<Utc>),
}

impl FetchWindow {
    pub fn since_unix(self) -> Option<i64> {
        match self {
            FetchWindow::All => None,
            FetchWindow::Since(at) => Some(at.timestamp()),
        }
    }
}

impl std::fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchWindow::All => write!(f, "the beginning"),
            FetchWindow::Since(at) => write!(f, "{}", at.to_rfc3339()),
        }
    }
}

/// Supplies article metadata keyed by external item id.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch(&self, window: FetchWindow) -> Result<BTreeMap<String, SourceFields>>;
}

/// Turns an article URL into raw page text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<String>;
}

/// Appends fixed-width rows to an external sheet and reports the number of
/// cells written.
#[async_trait]
pub trait SheetExporter: Send + Sync {
    async fn append(&self, rows: &[Vec<String>]) -> Result<u64>;
}
