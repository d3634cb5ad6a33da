use std::io::Read;

use tracing::{debug, info, warn};

use crate::aggregate::EntityTable;
use crate::decoder::{FieldMap, RowDecoder};
use crate::error::Result;
use crate::parallel;
use crate::readers::{ReaderOptions, RecordReader};
use crate::stats::ScanStats;
use crate::summary::{summarize, Summary, DEFAULT_TOP_K};
use crate::timestamp::TimestampFormats;

/// Default row cap per invocation.
pub const DEFAULT_MAX_ROWS: u64 = 50_000;

/// Everything the scan needs, resolved from CLI, env and config file.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Stop after this many data records. `None` scans to end of input.
    pub max_rows: Option<u64>,
    pub top_k: usize,
    pub fields: FieldMap,
    pub formats: TimestampFormats,
    pub reader: ReaderOptions,
    /// 1 scans on the calling thread; more shards the table across workers.
    pub threads: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_rows: Some(DEFAULT_MAX_ROWS),
            top_k: DEFAULT_TOP_K,
            fields: FieldMap::default(),
            formats: TimestampFormats::default(),
            reader: ReaderOptions::default(),
            threads: 1,
        }
    }
}

impl ScanConfig {
    pub(crate) fn cap_reached(&self, rows_scanned: u64) -> bool {
        self.max_rows.is_some_and(|cap| rows_scanned >= cap)
    }
}

/// Entity table plus the counters gathered while building it.
#[derive(Debug)]
pub struct ScanResult {
    pub table: EntityTable,
    pub stats: ScanStats,
}

/// Final result of a digest run.
#[derive(Debug)]
pub enum Outcome {
    Summary { summary: Summary, stats: ScanStats },
    /// Nothing was scanned: empty input, header only, or a zero cap.
    NoData { stats: ScanStats },
}

/// Open the record stream and build a decoder for its header.
pub(crate) fn prepare<R: Read>(
    reader: R,
    config: &ScanConfig,
) -> Result<(RecordReader<R>, RowDecoder)> {
    let records = RecordReader::new(reader, &config.reader)?;
    let decoder = RowDecoder::new(&config.fields, records.headers(), config.formats.clone());

    let missing = decoder.missing_columns();
    if !missing.is_empty() && !records.headers().is_empty() {
        warn!(columns = ?missing, "mapped columns not found in header, fields will be absent");
    }
    Ok((records, decoder))
}

/// Single pass over the input, folding each row into the entity table.
pub fn scan<R: Read>(reader: R, config: &ScanConfig) -> Result<ScanResult> {
    if config.threads > 1 {
        return parallel::scan_sharded(reader, config);
    }

    let (mut records, decoder) = prepare(reader, config)?;
    let mut table = EntityTable::new();
    let mut stats = ScanStats::new();
    debug!(max_rows = ?config.max_rows, "scan_started");

    loop {
        if config.cap_reached(stats.rows_scanned) {
            stats.capped = true;
            debug!(rows_scanned = stats.rows_scanned, "scan_capped");
            break;
        }
        let Some((ordinal, record)) = records.next_record()? else {
            break;
        };
        let row = decoder.decode(ordinal, record);
        stats.record_row(&row);
        table.fold_row(row);
    }

    stats.finish(table.len());
    Ok(ScanResult { table, stats })
}

/// Scan, then reduce. The entity table is dropped once the summary exists.
pub fn digest<R: Read>(reader: R, config: &ScanConfig) -> Result<Outcome> {
    let ScanResult { table, stats } = scan(reader, config)?;

    info!(
        rows_scanned = stats.rows_scanned,
        incidents = stats.entities,
        capped = stats.capped,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "scan_complete"
    );

    if table.is_empty() {
        warn!(rows_scanned = stats.rows_scanned, "no_data");
        return Ok(Outcome::NoData { stats });
    }

    let summary = summarize(&table, stats.rows_scanned, config.top_k);
    Ok(Outcome::Summary { summary, stats })
}
