//! Fetch → Extract → Summarize → Export over a shared record store.
//!
//! Every stage selects its work purely from field presence, so the pipeline
//! keeps no state between runs and re-running it is always safe.

mod runner;
mod stages;
#[cfg(test)]
mod testing;

use std::str::FromStr;
use std::sync::Arc;

use crate::ai::{HfTokenizer, RemoteModel, Summarizer, TextSummarizer};
use crate::config::{Config, SummarizerConfig};
use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::services::{
    ArticleSource, ContentExtractor, ContentFetcher, FetchWindow, PocketClient, SheetExporter,
    SheetsClient,
};

pub use runner::StageReport;
use runner::StageRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Extract,
    Summarize,
    Export,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Fetch, Stage::Extract, Stage::Summarize, Stage::Export];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Extract => "extract",
            Stage::Summarize => "summarize",
            Stage::Export => "export",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| AppError::Config(format!("unknown stage: {}", s)))
    }
}

pub struct Pipeline {
    store: Arc<dyn RecordStore>,
    source: Option<Arc<dyn ArticleSource>>,
    extractor: Option<Arc<dyn ContentExtractor>>,
    summarizer: Option<Arc<dyn TextSummarizer>>,
    exporter: Option<Arc<dyn SheetExporter>>,
    concurrency: usize,
}

impl Pipeline {
    pub fn new(store: Arc<dyn RecordStore>, concurrency: usize) -> Self {
        Self {
            store,
            source: None,
            extractor: None,
            summarizer: None,
            exporter: None,
            concurrency,
        }
    }

    /// Builds every collaborator the config has a section for. A section that
    /// fails to build is logged and left out, so only its own stage is skipped.
    pub fn from_config(config: &Config, store: Arc<dyn RecordStore>) -> Result<Self> {
        let mut pipeline = Self::new(store, config.concurrency)
            .with_extractor(Arc::new(ContentFetcher::new()?));

        if let Some(pocket) = &config.pocket {
            match PocketClient::new(pocket) {
                Ok(source) => pipeline = pipeline.with_source(Arc::new(source)),
                Err(e) => tracing::error!("Fetch disabled, [pocket] unusable: {}", e),
            }
        }

        if let Some(settings) = &config.summarizer {
            match build_summarizer(settings) {
                Ok(summarizer) => {
                    tracing::info!("Loaded model {}", summarizer.model_version());
                    pipeline = pipeline.with_summarizer(Arc::new(summarizer));
                }
                Err(e) => tracing::error!("Summarize disabled, [summarizer] unusable: {}", e),
            }
        }

        if let Some(sheets) = &config.sheets {
            match SheetsClient::new(sheets) {
                Ok(exporter) => pipeline = pipeline.with_exporter(Arc::new(exporter)),
                Err(e) => tracing::error!("Export disabled, [sheets] unusable: {}", e),
            }
        }

        Ok(pipeline)
    }

    pub fn with_source(mut self, source: Arc<dyn ArticleSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn ContentExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn TextSummarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn SheetExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Runs all four stages in order. Never fails; per-record problems are
    /// logged and picked up again next run.
    pub async fn run(&self, window: FetchWindow) -> Vec<(Stage, StageReport)> {
        let mut reports = Vec::with_capacity(Stage::ALL.len());
        for stage in Stage::ALL {
            reports.push((stage, self.run_stage(stage, window).await));
        }
        reports
    }

    pub async fn run_stage(&self, stage: Stage, window: FetchWindow) -> StageReport {
        let store = self.store.as_ref();
        let runner = StageRunner::new(store, stage, self.concurrency);

        match stage {
            Stage::Fetch => match &self.source {
                Some(source) => stages::fetch(store, source.as_ref(), window).await,
                None => not_configured(stage, "pocket"),
            },
            Stage::Extract => match &self.extractor {
                Some(extractor) => stages::extract(&runner, extractor.as_ref()).await,
                None => not_configured(stage, "extractor"),
            },
            Stage::Summarize => match &self.summarizer {
                Some(summarizer) => stages::summarize(&runner, summarizer.as_ref()).await,
                None => not_configured(stage, "summarizer"),
            },
            Stage::Export => match &self.exporter {
                Some(exporter) => stages::export(&runner, exporter.as_ref()).await,
                None => not_configured(stage, "sheets"),
            },
        }
    }
}

fn build_summarizer(settings: &SummarizerConfig) -> Result<Summarizer> {
    let tokenizer = HfTokenizer::from_file(&settings.tokenizer_path, &settings.sentinel_tokens)?;
    let model = RemoteModel::new(settings)?;
    Ok(Summarizer::new(
        Box::new(tokenizer),
        Box::new(model),
        settings.generation.clone(),
    ))
}

fn not_configured(stage: Stage, section: &str) -> StageReport {
    tracing::warn!("Skipping {}: no [{}] configured", stage, section);
    StageReport::default()
}
