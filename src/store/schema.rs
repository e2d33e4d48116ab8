//! Slot table schema and record type

use chrono::{DateTime, Utc};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS slots (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Slot holding the todo collection as a JSON array of items
pub const TODOS_SLOT: &str = "todos";

/// Slot holding the transcript as a JSON array of prefixed strings
pub const CHAT_HISTORY_SLOT: &str = "chatHistory";

/// A stored slot value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
