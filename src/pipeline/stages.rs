use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;

use crate::ai::TextSummarizer;
use crate::db::RecordStore;
use crate::error::Result;
use crate::models::{DerivedField, Field, FieldValue, Record};
use crate::services::{ArticleSource, ContentExtractor, FetchWindow, SheetExporter};

use super::runner::{RecordTransform, StageReport, StageRunner};

fn line_breaks() -> &'static Regex {
    static LINE_BREAKS: OnceLock<Regex> = OnceLock::new();
    LINE_BREAKS.get_or_init(|| Regex::new(r"(?:\r?\n)+").expect("static pattern"))
}

/// Collapses runs of line breaks to two spaces, transliterates to ASCII and
/// trims.
pub fn normalize_text(raw: &str) -> String {
    let collapsed = line_breaks().replace_all(raw, "  ");
    deunicode::deunicode(&collapsed).trim().to_string()
}

pub fn unix_ts(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Inserts every article the source returns, never touching existing ones.
pub async fn fetch(store: &dyn RecordStore, source: &dyn ArticleSource, window: FetchWindow) -> StageReport {
    tracing::info!("Retrieving newly saved articles since {}", window);

    let articles = match source.fetch(window).await {
        Ok(articles) => articles,
        Err(e) => {
            tracing::error!("Failed to fetch articles: {}", e);
            return StageReport::default();
        }
    };
    tracing::info!("Found {} new articles", articles.len());

    let mut report = StageReport {
        selected: articles.len(),
        ..Default::default()
    };

    for (item_id, fields) in articles {
        match store.insert_if_absent(&item_id, fields).await {
            Ok(true) => {
                tracing::info!("Added article {} to db", item_id);
                report.written += 1;
            }
            Ok(false) => report.skipped += 1,
            Err(e) => {
                tracing::error!("Failed to insert article {}: {}", item_id, e);
                report.failed += 1;
            }
        }
    }

    report
}

pub struct ExtractText<'a>(pub &'a dyn ContentExtractor);

#[async_trait]
impl RecordTransform for ExtractText<'_> {
    async fn transform(&self, record: &Record) -> Result<Option<FieldValue>> {
        let Some(url) = record.resolved_url.as_deref() else {
            return Ok(None);
        };

        let raw = self.0.extract(url).await?;
        let text = normalize_text(&raw);
        Ok((!text.is_empty()).then_some(FieldValue::Text(text)))
    }
}

pub async fn extract(runner: &StageRunner<'_>, extractor: &dyn ContentExtractor) -> StageReport {
    runner
        .run(DerivedField::FullText, &[Field::ResolvedUrl], &ExtractText(extractor))
        .await
}

pub struct SummarizeText<'a>(pub &'a dyn TextSummarizer);

#[async_trait]
impl RecordTransform for SummarizeText<'_> {
    async fn transform(&self, record: &Record) -> Result<Option<FieldValue>> {
        let Some(text) = record.full_text.as_deref() else {
            return Ok(None);
        };

        let summary = self.0.summarize(text).await?;
        Ok(Some(FieldValue::Text(summary)))
    }
}

pub async fn summarize(runner: &StageRunner<'_>, summarizer: &dyn TextSummarizer) -> StageReport {
    runner
        .run(DerivedField::SummaryText, &[Field::FullText], &SummarizeText(summarizer))
        .await
}

/// Writes the same value to every record it sees.
struct Stamp(FieldValue);

#[async_trait]
impl RecordTransform for Stamp {
    async fn transform(&self, _record: &Record) -> Result<Option<FieldValue>> {
        Ok(Some(self.0.clone()))
    }
}

/// Exports every unrecorded article in one batch, then marks the whole batch
/// with a single shared timestamp. A failed export marks nothing.
pub async fn export(runner: &StageRunner<'_>, exporter: &dyn SheetExporter) -> StageReport {
    let candidates = match runner.select(Field::RecordedTs, &[]).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to select articles for export: {}", e);
            return StageReport::default();
        }
    };

    tracing::info!("{} articles need to be recorded to the sheet", candidates.len());
    if candidates.is_empty() {
        return StageReport::default();
    }

    let rows: Vec<Vec<String>> = candidates.iter().map(Record::export_row).collect();
    match exporter.append(&rows).await {
        Ok(cells) => tracing::info!("{} cells added", cells),
        Err(e) => {
            if e.is_recoverable() {
                tracing::warn!("Sheet unreachable, export deferred: {}", e);
            } else {
                tracing::error!("Export failed: {:?}", e);
            }
            return StageReport {
                selected: candidates.len(),
                failed: candidates.len(),
                ..Default::default()
            };
        }
    }

    let recorded_ts = FieldValue::Timestamp(unix_ts(Utc::now()));
    runner
        .apply(candidates, DerivedField::RecordedTs, &Stamp(recorded_ts))
        .await
}
