mod repository;
mod schema;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DerivedField, Field, FieldValue, Record, SourceFields};

pub use repository::Repository;

/// Shared collection of article records keyed by `item_id`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records lacking `field`. Callers must not rely on the order.
    async fn find_missing(&self, field: Field) -> Result<Vec<Record>>;

    /// Creates the record unless `item_id` already exists. Returns whether a
    /// row was inserted.
    async fn insert_if_absent(&self, item_id: &str, fields: SourceFields) -> Result<bool>;

    /// Writes one derived field on an existing record that does not have it
    /// yet. Returns whether a write occurred.
    async fn set_field(&self, item_id: &str, field: DerivedField, value: FieldValue) -> Result<bool>;
}
