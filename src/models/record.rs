/// Columns a record can carry. `ItemId` is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ItemId,
    ResolvedUrl,
    ResolvedTitle,
    TimeAdded,
    WordCount,
    Excerpt,
    FullText,
    SummaryText,
    RecordedTs,
}

impl Field {
    pub fn column(self) -> &'static str {
        match self {
            Field::ItemId => "item_id",
            Field::ResolvedUrl => "resolved_url",
            Field::ResolvedTitle => "resolved_title",
            Field::TimeAdded => "time_added",
            Field::WordCount => "word_count",
            Field::Excerpt => "excerpt",
            Field::FullText => "full_text",
            Field::SummaryText => "summary_text",
            Field::RecordedTs => "recorded_ts",
        }
    }
}

/// Fields owned by a single enrichment stage. Only these can be written
/// after a record has been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedField {
    FullText,
    SummaryText,
    RecordedTs,
}

impl DerivedField {
    pub fn column(self) -> &'static str {
        Field::from(self).column()
    }
}

impl From<DerivedField> for Field {
    fn from(field: DerivedField) -> Self {
        match field {
            DerivedField::FullText => Field::FullText,
            DerivedField::SummaryText => Field::SummaryText,
            DerivedField::RecordedTs => Field::RecordedTs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Timestamp(f64),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Timestamp(_) => false,
        }
    }
}

/// Metadata supplied by the article source, written once at insert time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFields {
    pub resolved_url: Option<String>,
    pub resolved_title: Option<String>,
    pub time_added: Option<String>,
    pub word_count: Option<String>,
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub item_id: String,
    pub resolved_url: Option<String>,
    pub resolved_title: Option<String>,
    pub time_added: Option<String>,
    pub word_count: Option<String>,
    pub excerpt: Option<String>,
    pub full_text: Option<String>,
    pub summary_text: Option<String>,
    pub recorded_ts: Option<f64>,
}

impl Record {
    #[cfg(test)]
    pub fn new(item_id: impl Into<String>, source: SourceFields) -> Self {
        Self {
            item_id: item_id.into(),
            resolved_url: source.resolved_url,
            resolved_title: source.resolved_title,
            time_added: source.time_added,
            word_count: source.word_count,
            excerpt: source.excerpt,
            ..Default::default()
        }
    }

    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::ItemId => true,
            Field::ResolvedUrl => self.resolved_url.is_some(),
            Field::ResolvedTitle => self.resolved_title.is_some(),
            Field::TimeAdded => self.time_added.is_some(),
            Field::WordCount => self.word_count.is_some(),
            Field::Excerpt => self.excerpt.is_some(),
            Field::FullText => self.full_text.is_some(),
            Field::SummaryText => self.summary_text.is_some(),
            Field::RecordedTs => self.recorded_ts.is_some(),
        }
    }

    fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::ItemId => Some(&self.item_id),
            Field::ResolvedUrl => self.resolved_url.as_deref(),
            Field::ResolvedTitle => self.resolved_title.as_deref(),
            Field::TimeAdded => self.time_added.as_deref(),
            Field::WordCount => self.word_count.as_deref(),
            Field::Excerpt => self.excerpt.as_deref(),
            Field::FullText => self.full_text.as_deref(),
            Field::SummaryText => self.summary_text.as_deref(),
            Field::RecordedTs => None,
        }
    }

    /// Export row in [`EXPORT_COLUMNS`] order; missing values are empty.
    pub fn export_row(&self) -> Vec<String> {
        EXPORT_COLUMNS
            .iter()
            .map(|field| self.text(*field).unwrap_or_default().to_string())
            .collect()
    }
}

pub const EXPORT_COLUMNS: [Field; 8] = [
    Field::ItemId,
    Field::ResolvedUrl,
    Field::ResolvedTitle,
    Field::TimeAdded,
    Field::WordCount,
    Field::Excerpt,
    Field::FullText,
    Field::SummaryText,
];
