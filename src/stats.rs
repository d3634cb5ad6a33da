use std::time::{Duration, Instant};

use serde::Serialize;

use crate::decoder::Row;

/// Counters collected during one scan. Owned by the scan, returned with the table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    pub rows_scanned: u64,
    pub entities: u64,
    /// Rows whose entity id was empty and got a synthetic one.
    pub fallback_ids: u64,
    /// Timestamp cells that were present but matched no format.
    pub unparsed_timestamps: u64,
    /// The row cap was reached, even if the input ended on that row.
    pub capped: bool,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    #[serde(skip)]
    start_time: Option<Instant>,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl ScanStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn record_row(&mut self, row: &Row) {
        self.rows_scanned += 1;
        if row.fallback_id {
            self.fallback_ids += 1;
        }
        self.unparsed_timestamps += u64::from(row.unparsed_timestamps);
    }

    pub fn finish(&mut self, entities: usize) {
        self.entities = entities as u64;
        if let Some(start) = self.start_time {
            self.elapsed = start.elapsed();
        }
    }

    pub fn format_stats(&self) -> String {
        let mut output = format!(
            "Rows scanned: {} ({} incidents)",
            self.rows_scanned, self.entities
        );

        if self.capped {
            output.push_str(", stopped at row cap");
        }
        if self.fallback_ids > 0 {
            output.push_str(&format!(", {} rows without id", self.fallback_ids));
        }
        if self.unparsed_timestamps > 0 {
            output.push_str(&format!(
                ", {} unparsed timestamps",
                self.unparsed_timestamps
            ));
        }

        let processing_time_ms = self.elapsed.as_millis();
        output.push_str(&format!(" in {}ms", processing_time_ms));

        if processing_time_ms > 0 && self.rows_scanned > 0 {
            let rows_per_sec = (self.rows_scanned as f64 * 1000.0) / processing_time_ms as f64;
            output.push_str(&format!(" ({:.0} rows/s)", rows_per_sec));
        }

        output
    }
}
