use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{DerivedField, Field, FieldValue, Record, SourceFields};

use super::schema::{RECORD_COLUMNS, SCHEMA};
use super::RecordStore;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::with_connection(conn).await
    }

    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    #[cfg(test)]
    pub async fn get_record(&self, item_id: &str) -> Result<Option<Record>> {
        let item_id = item_id.to_string();
        let record = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM records WHERE item_id = ?1",
                    RECORD_COLUMNS
                ))?;
                let mut rows = stmt.query_map(params![item_id], record_from_row)?;
                let record = rows.next().transpose()?;
                Ok(record)
            })
            .await?;
        Ok(record)
    }

    pub async fn count_records(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl RecordStore for Repository {
    async fn find_missing(&self, field: Field) -> Result<Vec<Record>> {
        let sql = format!(
            "SELECT {} FROM records WHERE {} IS NULL",
            RECORD_COLUMNS,
            field.column()
        );
        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let records = stmt
                    .query_map([], record_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    async fn insert_if_absent(&self, item_id: &str, fields: SourceFields) -> Result<bool> {
        let item_id = item_id.to_string();
        let inserted = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    r#"INSERT INTO records (item_id, resolved_url, resolved_title, time_added, word_count, excerpt)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                       ON CONFLICT(item_id) DO NOTHING"#,
                    params![
                        item_id,
                        fields.resolved_url,
                        fields.resolved_title,
                        fields.time_added,
                        fields.word_count,
                        fields.excerpt,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(inserted)
    }

    async fn set_field(&self, item_id: &str, field: DerivedField, value: FieldValue) -> Result<bool> {
        let column = field.column();
        // Write-once: a completion marker is never replaced.
        let sql = format!(
            "UPDATE records SET {column} = ?1 WHERE item_id = ?2 AND {column} IS NULL"
        );
        let value = match value {
            FieldValue::Text(text) => Value::Text(text),
            FieldValue::Timestamp(ts) => Value::Real(ts),
        };
        let id = item_id.to_string();
        let (updated, exists) = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(&sql, params![value, id])?;
                if changed > 0 {
                    return Ok((true, true));
                }
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM records WHERE item_id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                Ok((false, count > 0))
            })
            .await?;

        if !exists {
            tracing::warn!("Cannot set {} on unknown article {}", column, item_id);
        } else if !updated {
            tracing::warn!("Article {} already has {}; leaving it unchanged", item_id, column);
        }

        Ok(updated)
    }
}

fn record_from_row(row: &Row) -> rusqlite::Result<Record> {
    Ok(Record {
        item_id: row.get(0)?,
        resolved_url: row.get(1)?,
        resolved_title: row.get(2)?,
        time_added: row.get(3)?,
        word_count: row.get(4)?,
        excerpt: row.get(5)?,
        full_text: row.get(6)?,
        summary_text: row.get(7)?,
        recorded_ts: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str, title: &str) -> SourceFields {
        SourceFields {
            resolved_url: Some(url.to_string()),
            resolved_title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn table_holds_exactly_the_record_columns() {
        let repo = Repository::in_memory().await.unwrap();

        let columns: Vec<String> = repo
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('records')")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(names)
            })
            .await
            .unwrap();

        let expected: Vec<&str> = RECORD_COLUMNS.split(", ").collect();
        assert_eq!(columns, expected);
    }

    #[tokio::test]
    async fn insert_if_absent_keeps_original_metadata() {
        let repo = Repository::in_memory().await.unwrap();

        assert!(repo.insert_if_absent("42", source("http://x", "First")).await.unwrap());
        assert!(!repo.insert_if_absent("42", source("http://y", "Second")).await.unwrap());

        let record = repo.get_record("42").await.unwrap().unwrap();
        assert_eq!(record.resolved_url.as_deref(), Some("http://x"));
        assert_eq!(record.resolved_title.as_deref(), Some("First"));
        assert_eq!(repo.count_records().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_missing_selects_by_absent_field() {
        let repo = Repository::in_memory().await.unwrap();
        repo.insert_if_absent("1", source("http://a", "A")).await.unwrap();
        repo.insert_if_absent("2", source("http://b", "B")).await.unwrap();
        repo.set_field("1", DerivedField::FullText, FieldValue::Text("body".into()))
            .await
            .unwrap();

        let missing = repo.find_missing(Field::FullText).await.unwrap();
        let ids: Vec<_> = missing.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);

        assert_eq!(repo.find_missing(Field::SummaryText).await.unwrap().len(), 2);
        assert!(repo.find_missing(Field::ItemId).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_field_is_write_once() {
        let repo = Repository::in_memory().await.unwrap();
        repo.insert_if_absent("1", SourceFields::default()).await.unwrap();

        let first = repo
            .set_field("1", DerivedField::SummaryText, FieldValue::Text("one".into()))
            .await
            .unwrap();
        let second = repo
            .set_field("1", DerivedField::SummaryText, FieldValue::Text("two".into()))
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        let record = repo.get_record("1").await.unwrap().unwrap();
        assert_eq!(record.summary_text.as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn set_field_on_unknown_record_is_a_no_op() {
        let repo = Repository::in_memory().await.unwrap();

        let updated = repo
            .set_field("missing", DerivedField::RecordedTs, FieldValue::Timestamp(1.5))
            .await
            .unwrap();

        assert!(!updated);
        assert_eq!(repo.count_records().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn timestamps_round_trip_as_real() {
        let repo = Repository::in_memory().await.unwrap();
        repo.insert_if_absent("1", SourceFields::default()).await.unwrap();
        repo.set_field("1", DerivedField::RecordedTs, FieldValue::Timestamp(1_600_000_000.25))
            .await
            .unwrap();

        let record = repo.get_record("1").await.unwrap().unwrap();
        assert_eq!(record.recorded_ts, Some(1_600_000_000.25));
    }

    #[tokio::test]
    async fn data_survives_reopening_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.db");
        let path = path.to_str().unwrap();

        {
            let repo = Repository::new(path).await.unwrap();
            repo.insert_if_absent("7", source("http://z", "Z")).await.unwrap();
        }

        let repo = Repository::new(path).await.unwrap();
        let record = repo.get_record("7").await.unwrap().unwrap();
        assert_eq!(record.resolved_title.as_deref(), Some("Z"));
    }
}
