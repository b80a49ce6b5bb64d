use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::db::RecordStore;
use crate::error::Result;
use crate::models::{DerivedField, Field, FieldValue, Record};

use super::Stage;

/// Stage-specific work for one record. `Ok(None)` means "nothing usable
/// yet"; the record is left as it was.
#[async_trait]
pub trait RecordTransform: Send + Sync {
    async fn transform(&self, record: &Record) -> Result<Option<FieldValue>>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub selected: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Written,
    Skipped,
    Failed,
}

/// Drives one stage over every eligible record. A record's failure is logged
/// and never stops the rest of the batch.
pub struct StageRunner<'a> {
    store: &'a dyn RecordStore,
    stage: Stage,
    concurrency: usize,
}

impl<'a> StageRunner<'a> {
    pub fn new(store: &'a dyn RecordStore, stage: Stage, concurrency: usize) -> Self {
        Self {
            store,
            stage,
            concurrency: concurrency.max(1),
        }
    }

    /// Records missing `target` that already carry every `required_present` field.
    pub async fn select(&self, target: Field, required_present: &[Field]) -> Result<Vec<Record>> {
        let records = self.store.find_missing(target).await?;
        Ok(records
            .into_iter()
            .filter(|record| required_present.iter().all(|field| record.has(*field)))
            .collect())
    }

    pub async fn run(
        &self,
        target: DerivedField,
        required_present: &[Field],
        transform: &dyn RecordTransform,
    ) -> StageReport {
        let candidates = match self.select(target.into(), required_present).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!("{}: failed to select articles: {}", self.stage, e);
                return StageReport::default();
            }
        };

        tracing::info!("{} articles need {}", candidates.len(), self.stage);
        self.apply(candidates, target, transform).await
    }

    /// Runs `transform` over an already selected batch and commits results.
    pub async fn apply(
        &self,
        candidates: Vec<Record>,
        target: DerivedField,
        transform: &dyn RecordTransform,
    ) -> StageReport {
        let mut report = StageReport {
            selected: candidates.len(),
            ..Default::default()
        };

        let outcomes: Vec<Outcome> = stream::iter(candidates)
            .map(|record| self.process(record, target, transform))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Outcome::Written => report.written += 1,
                Outcome::Skipped => report.skipped += 1,
                Outcome::Failed => report.failed += 1,
            }
        }

        tracing::info!(
            "{} finished: {} written, {} skipped, {} failed",
            self.stage,
            report.written,
            report.skipped,
            report.failed
        );
        report
    }

    async fn process(
        &self,
        record: Record,
        target: DerivedField,
        transform: &dyn RecordTransform,
    ) -> Outcome {
        let item_id = record.item_id.as_str();

        match transform.transform(&record).await {
            Ok(Some(value)) if !value.is_empty() => {
                match self.store.set_field(item_id, target, value).await {
                    Ok(true) => {
                        tracing::info!("Added {} of article {} to db", target.column(), item_id);
                        Outcome::Written
                    }
                    Ok(false) => Outcome::Skipped,
                    Err(e) => {
                        tracing::error!("Failed to store {} for article {}: {}", target.column(), item_id, e);
                        Outcome::Failed
                    }
                }
            }
            Ok(_) => {
                tracing::info!("Empty {} for article {}", target.column(), item_id);
                Outcome::Skipped
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!("{} skipped article {}: {}", self.stage, item_id, e);
                Outcome::Failed
            }
            Err(e) => {
                tracing::error!("{} failed on article {}: {:?}", self.stage, item_id, e);
                Outcome::Failed
            }
        }
    }
}
