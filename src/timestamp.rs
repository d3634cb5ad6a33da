use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;

use crate::error::{DigestError, Result};

/// Formats tried in order when no override is configured.
pub const DEFAULT_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M",    // 13/02/2016 09:14
    "%d/%m/%Y %H:%M:%S", // 13/02/2016 09:14:02
    "%Y-%m-%d %H:%M:%S", // 2016-02-13 09:14:02
    "%Y-%m-%d %H:%M",    // 2016-02-13 09:14
];

/// Values that mean "unknown" in exported ticket logs.
const UNKNOWN_SENTINELS: &[&str] = &["?", "null", "None"];

/// Ordered list of strftime patterns. The first pattern that parses wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFormats {
    formats: Vec<String>,
}

impl TimestampFormats {
    /// Build a format list, rejecting an empty list or malformed patterns.
    pub fn new(formats: Vec<String>) -> Result<Self> {
        if formats.is_empty() {
            return Err(DigestError::Config(
                "at least one timestamp format is required".to_string(),
            ));
        }
        for format in &formats {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(DigestError::Config(format!(
                    "invalid timestamp format '{}'",
                    format
                )));
            }
        }
        Ok(Self { formats })
    }

    pub fn as_slice(&self) -> &[String] {
        &self.formats
    }
}

impl Default for TimestampFormats {
    fn default() -> Self {
        Self {
            formats: DEFAULT_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Outcome of reading one timestamp cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsField {
    /// Empty cell or an "unknown" sentinel.
    Missing,
    Parsed(NaiveDateTime),
    /// Something was there but no format matched it.
    Unrecognized,
}

impl TsField {
    pub fn parsed(self) -> Option<NaiveDateTime> {
        match self {
            TsField::Parsed(dt) => Some(dt),
            TsField::Missing | TsField::Unrecognized => None,
        }
    }
}

/// Classify a raw cell against the format list. Never fails.
pub fn classify(raw: &str, formats: &TimestampFormats) -> TsField {
    let raw = raw.trim();
    if raw.is_empty() || UNKNOWN_SENTINELS.contains(&raw) {
        return TsField::Missing;
    }

    formats
        .as_slice()
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map_or(TsField::Unrecognized, TsField::Parsed)
}

/// Lenient parse: sentinels and unrecognized values both come back as `None`.
pub fn parse_timestamp(raw: &str, formats: &TimestampFormats) -> Option<NaiveDateTime> {
    classify(raw, formats).parsed()
}

/// Wall-clock difference in fractional hours. Negative when `end` precedes `start`.
pub fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let delta = end - start;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 3_600_000_000.0,
        None => delta.num_seconds() as f64 / 3600.0,
    }
}
