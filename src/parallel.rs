//! Sharded aggregation.
//!
//! The calling thread reads and decodes records (it alone enforces the row
//! cap) and routes each row by a hash of its entity id to one worker. Each
//! worker owns a private [`EntityTable`], so no entity is ever folded on two
//! threads and no locking is needed. At end of input the partial tables are
//! merged and put back in stream order.

use std::io::Read;
use std::thread;

use crossbeam_channel::{bounded, Sender};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::aggregate::EntityTable;
use crate::decoder::Row;
use crate::error::{DigestError, Result};
use crate::pipeline::{prepare, ScanConfig, ScanResult};
use crate::stats::ScanStats;

/// Rows per message sent to a worker.
const BATCH_SIZE: usize = 1024;
/// Batches each worker queue may hold before the reader blocks.
const QUEUE_DEPTH: usize = 8;

/// Worker index for an entity id.
pub fn shard_for(entity_id: &str, shards: usize) -> usize {
    (xxh3_64(entity_id.as_bytes()) % shards as u64) as usize
}

/// Worker count for `--threads 0`.
pub fn default_threads() -> usize {
    num_cpus::get().max(1)
}

pub fn scan_sharded<R: Read>(reader: R, config: &ScanConfig) -> Result<ScanResult> {
    let shards = config.threads.max(1);
    let (mut records, decoder) = prepare(reader, config)?;
    let mut stats = ScanStats::new();
    debug!(shards, max_rows = ?config.max_rows, "scan_started");

    let mut senders: Vec<Sender<Vec<Row>>> = Vec::with_capacity(shards);
    let mut handles = Vec::with_capacity(shards);
    for worker_id in 0..shards {
        let (tx, rx) = bounded::<Vec<Row>>(QUEUE_DEPTH);
        senders.push(tx);
        let handle = thread::Builder::new()
            .name(format!("digest-shard-{}", worker_id))
            .spawn(move || {
                let mut table = EntityTable::new();
                for batch in rx {
                    for row in batch {
                        table.fold_row(row);
                    }
                }
                table
            })?;
        handles.push(handle);
    }

    let mut batches: Vec<Vec<Row>> = (0..shards).map(|_| Vec::with_capacity(BATCH_SIZE)).collect();

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

        let shard = shard_for(&row.entity_id, shards);
        batches[shard].push(row);
        if batches[shard].len() >= BATCH_SIZE {
            let full = std::mem::replace(&mut batches[shard], Vec::with_capacity(BATCH_SIZE));
            send_batch(&senders[shard], full, shard)?;
        }
    }

    for (shard, batch) in batches.into_iter().enumerate() {
        if !batch.is_empty() {
            send_batch(&senders[shard], batch, shard)?;
        }
    }
    // Closing the queues lets the workers drain and return.
    drop(senders);

    let mut table = EntityTable::new();
    for (worker_id, handle) in handles.into_iter().enumerate() {
        let partial = handle
            .join()
            .map_err(|_| DigestError::Worker(worker_id))?;
        table.merge(partial);
    }

    stats.finish(table.len());
    Ok(ScanResult { table, stats })
}

fn send_batch(sender: &Sender<Vec<Row>>, batch: Vec<Row>, shard: usize) -> Result<()> {
    // A closed queue means the worker is gone, which only happens on panic.
    sender.send(batch).map_err(|_| DigestError::Worker(shard))
}
