//! Stub collaborators for stage and pipeline tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ai::TextSummarizer;
use crate::error::{AppError, Result};
use crate::models::SourceFields;
use crate::services::{ArticleSource, ContentExtractor, FetchWindow, SheetExporter};

pub struct FixedSource(pub BTreeMap<String, SourceFields>);

#[async_trait]
impl ArticleSource for FixedSource {
    async fn fetch(&self, _window: FetchWindow) -> Result<BTreeMap<String, SourceFields>> {
        Ok(self.0.clone())
    }
}

/// Returns the same text for every URL, or fails as unreachable.
pub struct FixedExtractor {
    text: Option<String>,
    calls: AtomicUsize,
}

impl FixedExtractor {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            text: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentExtractor for FixedExtractor {
    async fn extract(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .clone()
            .ok_or_else(|| AppError::Unreachable(url.to_string()))
    }
}

pub struct FixedSummarizer(pub String);

#[async_trait]
impl TextSummarizer for FixedSummarizer {
    async fn summarize(&self, _text: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reports a fixed cell count and keeps every batch it receives.
pub struct FixedExporter {
    cells: Option<u64>,
    batches: Mutex<Vec<Vec<Vec<String>>>>,
}

impl FixedExporter {
    pub fn cells(cells: u64) -> Self {
        Self {
            cells: Some(cells),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            cells: None,
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn batches(&self) -> Vec<Vec<Vec<String>>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetExporter for FixedExporter {
    async fn append(&self, rows: &[Vec<String>]) -> Result<u64> {
        let cells = self
            .cells
            .ok_or_else(|| AppError::Unreachable("sheet".to_string()))?;
        self.batches.lock().unwrap().push(rows.to_vec());
        Ok(cells)
    }
}
