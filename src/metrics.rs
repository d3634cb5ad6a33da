//! Small sample of a system performance CSV, used as context next to the
//! incident summary in the posture brief.

use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::readers::{ReaderOptions, RecordReader};

pub const DEFAULT_SAMPLE_ROWS: usize = 30;
const HEAD_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub timestamp: String,
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    /// Rows that parsed, at most the sample size.
    pub count: u64,
    pub averages: Averages,
    /// First few parsed rows, kept small on purpose for payload size.
    pub head: Vec<MetricRow>,
}

struct Columns {
    timestamp: usize,
    cpu: usize,
    memory: usize,
    disk: usize,
}

impl Columns {
    fn resolve(headers: &[String]) -> Option<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Some(Self {
            timestamp: find("timestamp")?,
            cpu: find("cpu_usage")?,
            memory: find("memory_usage")?,
            disk: find("disk_usage")?,
        })
    }
}

/// Read the first `sample_rows` records and average CPU, memory and disk.
///
/// Rows with a missing or non-numeric value are skipped but still use up a
/// slot in the window. Returns `None` when nothing parsed.
pub fn sample_metrics<R: Read>(reader: R, sample_rows: usize) -> Result<Option<MetricsSample>> {
    let mut records = RecordReader::new(reader, &ReaderOptions::default())?;
    let Some(columns) = Columns::resolve(records.headers()) else {
        debug!(headers = ?records.headers(), "metrics columns missing");
        return Ok(None);
    };

    let mut count = 0u64;
    let mut head = Vec::with_capacity(HEAD_ROWS);
    let (mut cpu, mut memory, mut disk) = (0.0, 0.0, 0.0);

    while let Some((ordinal, record)) = records.next_record()? {
        if ordinal > sample_rows as u64 {
            break;
        }
        let text = |i: usize| record.get(i).map(String::from_utf8_lossy);
        let number = |i: usize| text(i).and_then(|v| v.trim().parse::<f64>().ok());

        let (Some(timestamp), Some(c), Some(m), Some(d)) = (
            text(columns.timestamp),
            number(columns.cpu),
            number(columns.memory),
            number(columns.disk),
        ) else {
            debug!(ordinal, "skipping malformed metrics row");
            continue;
        };

        cpu += c;
        memory += m;
        disk += d;
        count += 1;
        if head.len() < HEAD_ROWS {
            head.push(MetricRow {
                timestamp: timestamp.into_owned(),
                cpu: c,
                memory: m,
                disk: d,
            });
        }
    }

    if count == 0 {
        return Ok(None);
    }
    let n = count as f64;
    Ok(Some(MetricsSample {
        count,
        averages: Averages {
            cpu: cpu / n,
            memory: memory / n,
            disk: disk / n,
        },
        head,
    }))
}
