use csv::{ByteRecord, ReaderBuilder};
use std::io::Read;

use crate::error::Result;

/// Dialect options for the incremental record reader.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub delimiter: u8,
    /// When false, columns are named c1, c2, c3... from the first record's width.
    pub has_headers: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

/// Pulls one delimited record at a time, reusing a single buffer.
///
/// Nothing beyond the current record is held in memory. Ragged records are
/// accepted; invalid UTF-8 is left to the decoder to replace.
pub struct RecordReader<R: Read> {
    inner: csv::Reader<R>,
    headers: Vec<String>,
    record: ByteRecord,
    pending: bool,
    ordinal: u64,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R, options: &ReaderOptions) -> Result<Self> {
        let mut inner = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(options.has_headers)
            .flexible(true)
            .from_reader(reader);

        let mut record = ByteRecord::new();
        let mut pending = false;

        let headers = if options.has_headers {
            inner
                .byte_headers()?
                .iter()
                .map(|h| String::from_utf8_lossy(h).trim().to_string())
                .collect()
        } else if inner.read_byte_record(&mut record)? {
            // First data record only sizes the synthetic header; keep it for next_record.
            pending = true;
            (1..=record.len()).map(|i| format!("c{}", i)).collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            inner,
            headers,
            record,
            pending,
            ordinal: 0,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Advance to the next data record. Returns its 1-based ordinal and contents.
    pub fn next_record(&mut self) -> Result<Option<(u64, &ByteRecord)>> {
        if self.pending {
            self.pending = false;
        } else if !self.inner.read_byte_record(&mut self.record)? {
            return Ok(None);
        }
        self.ordinal += 1;
        Ok(Some((self.ordinal, &self.record)))
    }
}
