use chrono::NaiveDateTime;
use csv::ByteRecord;
use serde::Serialize;

use crate::timestamp::{classify, TimestampFormats, TsField};

/// Column names the decoder looks up in the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMap {
    pub entity: String,
    pub category: String,
    pub priority: String,
    pub opened: String,
    pub resolved: String,
    pub closed: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            entity: "number".to_string(),
            category: "category".to_string(),
            priority: "priority".to_string(),
            opened: "opened_at".to_string(),
            resolved: "resolved_at".to_string(),
            closed: "closed_at".to_string(),
        }
    }
}

/// One decoded record. Consumed by the aggregator and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based position of the data record in the stream.
    pub ordinal: u64,
    pub entity_id: String,
    /// True when `entity_id` was synthesized from the ordinal.
    pub fallback_id: bool,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub opened_at: Option<NaiveDateTime>,
    pub resolved_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    /// Timestamp cells that held something no format recognized.
    pub unparsed_timestamps: u8,
}

impl Row {
    /// Minimal row for an entity, with every optional field absent.
    pub fn new(ordinal: u64, entity_id: impl Into<String>) -> Self {
        Self {
            ordinal,
            entity_id: entity_id.into(),
            fallback_id: false,
            category: None,
            priority: None,
            opened_at: None,
            resolved_at: None,
            closed_at: None,
            unparsed_timestamps: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ColumnIndex {
    entity: Option<usize>,
    category: Option<usize>,
    priority: Option<usize>,
    opened: Option<usize>,
    resolved: Option<usize>,
    closed: Option<usize>,
}

/// Turns raw records into [`Row`]s using positions resolved from the header.
#[derive(Debug, Clone)]
pub struct RowDecoder {
    columns: ColumnIndex,
    formats: TimestampFormats,
}

impl RowDecoder {
    pub fn new(fields: &FieldMap, headers: &[String], formats: TimestampFormats) -> Self {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };

        Self {
            columns: ColumnIndex {
                entity: position(&fields.entity),
                category: position(&fields.category),
                priority: position(&fields.priority),
                opened: position(&fields.opened),
                resolved: position(&fields.resolved),
                closed: position(&fields.closed),
            },
            formats,
        }
    }

    /// Logical fields whose column was not found in the header.
    pub fn missing_columns(&self) -> Vec<&'static str> {
        let c = &self.columns;
        [
            ("entity", c.entity),
            ("category", c.category),
            ("priority", c.priority),
            ("opened", c.opened),
            ("resolved", c.resolved),
            ("closed", c.closed),
        ]
        .into_iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn decode(&self, ordinal: u64, record: &ByteRecord) -> Row {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(String::from_utf8_lossy)
        };
        let text = |idx: Option<usize>| {
            cell(idx)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let (entity_id, fallback_id) = match text(self.columns.entity) {
            Some(id) => (id, false),
            None => (format!("row{}", ordinal), true),
        };

        let mut unparsed_timestamps = 0u8;
        let mut timestamp = |idx: Option<usize>| match cell(idx) {
            Some(raw) => match classify(&raw, &self.formats) {
                TsField::Parsed(dt) => Some(dt),
                TsField::Missing => None,
                TsField::Unrecognized => {
                    tracing::trace!(ordinal, value = %raw, "unrecognized timestamp");
                    unparsed_timestamps += 1;
                    None
                }
            },
            None => None,
        };

        let opened_at = timestamp(self.columns.opened);
        let resolved_at = timestamp(self.columns.resolved);
        let closed_at = timestamp(self.columns.closed);

        Row {
            ordinal,
            entity_id,
            fallback_id,
            category: text(self.columns.category),
            priority: text(self.columns.priority),
            opened_at,
            resolved_at,
            closed_at,
            unparsed_timestamps,
        }
    }
}
