#![no_main]

use csv::ByteRecord;
use incident_digest::timestamp::TimestampFormats;
use incident_digest::{FieldMap, RowDecoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed cells must decode to absent values, never panic.
    let headers: Vec<String> = ["number", "category", "priority", "opened_at", "resolved_at", "closed_at"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let decoder = RowDecoder::new(&FieldMap::default(), &headers, TimestampFormats::default());

    let record: ByteRecord = data.split(|&b| b == b',').collect();
    let row = decoder.decode(1, &record);
    assert!(!row.entity_id.is_empty());
});
