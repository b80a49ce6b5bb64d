pub const SCHEMA: &str = r#"
-- records table: one row per saved article
CREATE TABLE IF NOT EXISTS records (
    item_id TEXT PRIMARY KEY NOT NULL,
    resolved_url TEXT,
    resolved_title TEXT,
    time_added TEXT,
    word_count TEXT,
    excerpt TEXT,
    full_text TEXT,
    summary_text TEXT,
    recorded_ts REAL
);

CREATE INDEX IF NOT EXISTS idx_records_full_text_missing ON records(item_id) WHERE full_text IS NULL;
CREATE INDEX IF NOT EXISTS idx_records_summary_missing ON records(item_id) WHERE summary_text IS NULL;
CREATE INDEX IF NOT EXISTS idx_records_unrecorded ON records(item_id) WHERE recorded_ts IS NULL;
"#;

pub const RECORD_COLUMNS: &str = "item_id, resolved_url, resolved_title, time_added, word_count, excerpt, full_text, summary_text, recorded_ts";
